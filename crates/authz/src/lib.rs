//! Caller identity and the capability table that gates every catalog operation.
//!
//! Access is decided by looking up `(entity, operation)` in [`CAPABILITIES`];
//! there is no per-handler branching on action names.

use std::collections::HashSet;

use thiserror::Error;

/// Catalog resources guarded by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Author,
    Book,
    Genre,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Book => "book",
            Self::Genre => "genre",
        }
    }
}

/// Operations exposed for every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Retrieve => "retrieve",
            Self::Create => "create",
            Self::Update => "update",
            Self::PartialUpdate => "partial_update",
            Self::Delete => "delete",
        }
    }
}

/// Privilege an operation demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    Admin,
}

/// One row of the capability table.
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    pub entity: Entity,
    pub operation: Operation,
    pub access: Access,
}

const fn cap(entity: Entity, operation: Operation, access: Access) -> Capability {
    Capability {
        entity,
        operation,
        access,
    }
}

pub const CAPABILITIES: &[Capability] = &[
    // authors
    cap(Entity::Author, Operation::List, Access::Anyone),
    cap(Entity::Author, Operation::Retrieve, Access::Anyone),
    cap(Entity::Author, Operation::Create, Access::Admin),
    cap(Entity::Author, Operation::Update, Access::Admin),
    cap(Entity::Author, Operation::PartialUpdate, Access::Admin),
    cap(Entity::Author, Operation::Delete, Access::Admin),
    // books
    cap(Entity::Book, Operation::List, Access::Anyone),
    cap(Entity::Book, Operation::Retrieve, Access::Anyone),
    cap(Entity::Book, Operation::Create, Access::Admin),
    cap(Entity::Book, Operation::Update, Access::Admin),
    cap(Entity::Book, Operation::PartialUpdate, Access::Admin),
    cap(Entity::Book, Operation::Delete, Access::Admin),
    // genres
    cap(Entity::Genre, Operation::List, Access::Anyone),
    cap(Entity::Genre, Operation::Retrieve, Access::Anyone),
    cap(Entity::Genre, Operation::Create, Access::Admin),
    cap(Entity::Genre, Operation::Update, Access::Admin),
    cap(Entity::Genre, Operation::PartialUpdate, Access::Admin),
    cap(Entity::Genre, Operation::Delete, Access::Admin),
];

/// Privilege required for `operation` on `entity`. Pairs missing from the
/// table are treated as admin-only.
pub fn required_access(entity: Entity, operation: Operation) -> Access {
    CAPABILITIES
        .iter()
        .find(|c| c.entity == entity && c.operation == operation)
        .map(|c| c.access)
        .unwrap_or(Access::Admin)
}

/// Who is making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Caller {
    #[default]
    Anonymous,
    User,
    Admin,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Raised when a caller lacks the privilege an operation requires.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{caller:?} caller may not {} {}", .operation.as_str(), .entity.as_str())]
pub struct Denied {
    pub entity: Entity,
    pub operation: Operation,
    pub caller: Caller,
}

/// Check the table for `caller`.
pub fn authorize(entity: Entity, operation: Operation, caller: Caller) -> Result<(), Denied> {
    let granted = match required_access(entity, operation) {
        Access::Anyone => true,
        Access::Admin => caller.is_admin(),
    };

    if granted {
        Ok(())
    } else {
        tracing::debug!(
            entity = entity.as_str(),
            operation = operation.as_str(),
            ?caller,
            "operation denied"
        );
        Err(Denied {
            entity,
            operation,
            caller,
        })
    }
}

/// Known bearer tokens and the caller each one identifies.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    admin: HashSet<String>,
    user: HashSet<String>,
}

impl Credentials {
    pub fn new<A, U>(admin: A, user: U) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            admin: admin.into_iter().map(Into::into).collect(),
            user: user.into_iter().map(Into::into).collect(),
        }
    }

    /// `None` for tokens nobody issued.
    pub fn resolve(&self, token: &str) -> Option<Caller> {
        if self.admin.contains(token) {
            Some(Caller::Admin)
        } else if self.user.contains(token) {
            Some(Caller::User)
        } else {
            None
        }
    }
}

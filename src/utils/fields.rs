//! Text field cleaning shared by the entity forms.

use libris_kernel::ValidationErrors;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

/// Trim a required text value and enforce non-blank and `max_chars`.
/// Records the failure under `field` and returns `None` on error.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_chars: usize,
) -> Option<String> {
    let Some(value) = value else {
        errors.add_field(field, REQUIRED);
        return None;
    };
    let value = value.trim();
    if value.is_empty() {
        errors.add_field(field, BLANK);
        return None;
    }
    if value.chars().count() > max_chars {
        errors.add_field(field, too_long(max_chars));
        return None;
    }
    Some(value.to_string())
}

pub fn too_long(max_chars: usize) -> String {
    format!("Ensure this field has no more than {max_chars} characters.")
}

/// How an inbound payload relates to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// New record; every required field must be present.
    Create,
    /// Full update (PUT); required fields must be present again.
    Replace,
    /// Partial update (PATCH); absent fields keep their current value.
    Partial,
}

impl WriteMode {
    /// Inbound value, falling back to `current` only for partial updates.
    pub fn pick<T>(self, inbound: Option<T>, current: Option<T>) -> Option<T> {
        match self {
            Self::Partial => inbound.or(current),
            Self::Create | Self::Replace => inbound,
        }
    }
}

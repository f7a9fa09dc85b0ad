pub mod module;
pub mod registry;
pub mod settings;
pub mod validation;

pub use libris_db::{Database, Migration};
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use validation::{ValidationErrors, NON_FIELD_ERRORS};

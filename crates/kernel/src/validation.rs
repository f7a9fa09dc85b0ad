//! Structured validation failures.
//!
//! Field errors are keyed by the input field name; record-level errors that
//! cannot be pinned on a single field live under [`NON_FIELD_ERRORS`].

use std::collections::BTreeMap;

use serde::Serialize;

/// Reserved key for record-level errors.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single field error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add_field(field, message);
        errors
    }

    /// Single record-level error.
    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add_non_field(message);
        errors
    }

    pub fn add_field(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add_field(NON_FIELD_ERRORS, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, empty if none.
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn non_field_messages(&self) -> &[String] {
        self.messages(NON_FIELD_ERRORS)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_flat_field_map() {
        let mut errors = ValidationErrors::field("year", "out of range");
        errors.add_non_field("duplicate");

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "year": ["out of range"], "non_field_errors": ["duplicate"] })
        );
    }

    #[test]
    fn messages_accumulate_per_field() {
        let mut errors = ValidationErrors::non_field("first");
        errors.add_non_field("second");

        assert_eq!(errors.non_field_messages(), ["first", "second"]);
        assert!(errors.messages("title").is_empty());
        assert!(errors.into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}

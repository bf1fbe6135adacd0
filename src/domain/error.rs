//! Domain error types.

use crate::domain::validation::FieldError;

/// Top-level error type for tradelog.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Database { .. } | JournalError::DatabaseQuery { .. } => 3,
            JournalError::Validation(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_fields() {
        let err = JournalError::Validation(vec![
            FieldError::new("instrument", "must not be empty"),
            FieldError::new("size", "must be greater than zero"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("instrument: must not be empty"));
        assert!(msg.contains("size: must be greater than zero"));
    }

    #[test]
    fn config_missing_names_section_and_key() {
        let err = JournalError::ConfigMissing {
            section: "auth".into(),
            key: "username".into(),
        };
        assert_eq!(err.to_string(), "missing config key [auth] username");
    }
}

//! Error types for field descriptors

use thiserror::Error;

/// Result type for field operations
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors raised while building, validating, or converting fields
#[derive(Debug, Error)]
pub enum FieldError {
    /// A container was given an element type that is not a field descriptor
    #[error("Invalid field type '{found}'; must be a field descriptor")]
    InvalidFieldType { found: String },

    /// A field was declared with options that do not fit its kind
    #[error("invalid {kind} configuration: {message}")]
    InvalidFieldConfig { kind: String, message: String },

    /// A value was rejected by a field that has not been attached to a name yet
    #[error("{message}")]
    Invalid { message: String },

    /// A value was rejected by a named field
    #[error("validation error on field '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// A document carried a key its type does not declare
    #[error("unknown field '{field}' on document type '{document_type}'")]
    UnknownField {
        document_type: String,
        field: String,
    },

    /// Embedded document type not found in the registry
    #[error("document type not registered: {name}")]
    UnknownDocumentType { name: String },

    /// Document type registered twice
    #[error("duplicate document type: {name}")]
    DuplicateDocumentType { name: String },

    /// Array blob could not be encoded or decoded
    #[error("array codec error: {message}")]
    Codec { message: String },

    /// JSON bridge error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML schema error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Configuration could not be extracted
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

impl FieldError {
    /// A validation failure raised from inside a field descriptor.
    pub fn invalid(message: impl Into<String>) -> Self {
        FieldError::Invalid {
            message: message.into(),
        }
    }

    pub(crate) fn codec(message: impl std::fmt::Display) -> Self {
        FieldError::Codec {
            message: message.to_string(),
        }
    }

    /// Attach the name of the field that raised this error.
    ///
    /// Errors that already carry a field name get a dotted path, so a failure
    /// inside an embedded document reads `outer.inner`.
    pub fn for_field(self, name: &str) -> Self {
        match self {
            FieldError::Invalid { message } => FieldError::ValidationFailed {
                field: name.to_string(),
                message,
            },
            FieldError::ValidationFailed { field, message } => FieldError::ValidationFailed {
                field: format!("{name}.{field}"),
                message,
            },
            other => other,
        }
    }

    /// The human-readable validation message, if this is a validation error.
    pub fn message(&self) -> Option<&str> {
        match self {
            FieldError::Invalid { message } | FieldError::ValidationFailed { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    /// Whether this error rejects a value (as opposed to a schema or codec fault).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FieldError::Invalid { .. }
                | FieldError::ValidationFailed { .. }
                | FieldError::UnknownField { .. }
        )
    }
}

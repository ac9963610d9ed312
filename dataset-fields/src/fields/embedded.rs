//! Fields holding documents of a registered type.

use std::fmt;
use std::sync::Arc;

use super::FieldDescriptor;
use crate::document::{DocumentRegistry, DocumentType, WeakRegistry};
use crate::error::{FieldError, Result};
use crate::value::Value;

/// A field that stores documents of a declared type.
///
/// The type is fixed by name at construction and resolved through the
/// registry on each use, so it only needs to be registered before the first
/// value is validated or converted. The field does not keep the registry
/// alive.
#[derive(Clone)]
pub struct EmbeddedDocumentField {
    document_type: String,
    registry: WeakRegistry,
}

impl EmbeddedDocumentField {
    pub fn new(document_type: impl Into<String>, registry: &DocumentRegistry) -> Self {
        Self {
            document_type: document_type.into(),
            registry: registry.downgrade(),
        }
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    /// Resolve the declared type through the registry.
    pub fn resolve(&self) -> Result<Arc<DocumentType>> {
        self.registry.resolve(&self.document_type)
    }

    fn wrong_instance(&self) -> FieldError {
        FieldError::invalid(format!(
            "Invalid embedded document instance provided to an EmbeddedDocumentField; expected {}",
            self.document_type
        ))
    }
}

impl fmt::Debug for EmbeddedDocumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedDocumentField")
            .field("document_type", &self.document_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for EmbeddedDocumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmbeddedDocumentField({})", self.document_type)
    }
}

impl FieldDescriptor for EmbeddedDocumentField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Document(doc) if doc.document_type() == self.document_type => {
                Ok(Value::Dict(self.resolve()?.to_storage(doc)?))
            }
            _ => Err(self.wrong_instance()),
        }
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Document(doc) if doc.document_type() == self.document_type => {
                Ok(Value::Document(doc))
            }
            Value::Dict(stored) => Ok(Value::Document(self.resolve()?.from_storage(stored)?)),
            _ => Err(self.wrong_instance()),
        }
    }

    fn validate(&self, value: &Value) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::Document(doc) if doc.document_type() == self.document_type => {
                self.resolve()?.validate(doc)
            }
            _ => Err(self.wrong_instance()),
        }
    }
}

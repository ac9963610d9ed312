//! Document types, embedded document values, and the registry that resolves
//! embedded types by name.
//!
//! A [`DocumentType`] is an ordered set of named [`Field`]s. Types are
//! registered in a [`DocumentRegistry`] and looked up lazily by
//! [`EmbeddedDocumentField`](crate::fields::EmbeddedDocumentField), so types
//! can refer to each other, or to themselves, regardless of declaration order.

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{FieldError, Result};
use crate::fields::{EmbeddedDocumentField, Field, FieldDescriptor};
use crate::value::{Dict, Value};

/// Key carrying the document type name in the stored form.
pub const CLASS_KEY: &str = "_cls";

/// An instance of a document type: the type name plus its field values.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedDocument {
    document_type: String,
    values: Dict,
}

impl EmbeddedDocument {
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            values: Dict::new(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn values(&self) -> &Dict {
        &self.values
    }
}

/// Schema of a document: its name and ordered field descriptors.
#[derive(Debug, Clone)]
pub struct DocumentType {
    name: String,
    fields: IndexMap<String, Field>,
    strict: bool,
}

impl DocumentType {
    /// A new strict document type with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            strict: true,
        }
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.fields.insert(name.into(), field.into());
        self
    }

    /// Strict types reject undeclared keys; lenient types drop them.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// An empty document of this type with container defaults filled in.
    pub fn new_document(&self) -> EmbeddedDocument {
        let mut doc = EmbeddedDocument::new(&self.name);
        for (name, field) in &self.fields {
            let default = field.default_value();
            if !default.is_null() {
                doc.set(name.clone(), default);
            }
        }
        doc
    }

    fn unknown_field(&self, field: &str) -> FieldError {
        FieldError::UnknownField {
            document_type: self.name.clone(),
            field: field.to_string(),
        }
    }

    /// Validate every set field of `doc` against its descriptor.
    pub fn validate(&self, doc: &EmbeddedDocument) -> Result<()> {
        if doc.document_type() != self.name {
            return Err(FieldError::invalid(format!(
                "Expected a {} document, got {}",
                self.name,
                doc.document_type()
            )));
        }
        if self.strict {
            if let Some(key) = doc.values().keys().find(|k| !self.fields.contains_key(*k)) {
                return Err(self.unknown_field(key));
            }
        }
        for (name, field) in &self.fields {
            if let Some(value) = doc.get(name) {
                field.validate(value).map_err(|e| e.for_field(name))?;
            }
        }
        Ok(())
    }

    /// Validate `doc` and convert it to its stored dictionary.
    ///
    /// The first key is [`CLASS_KEY`]; unset fields are omitted.
    pub fn to_storage(&self, doc: &EmbeddedDocument) -> Result<Dict> {
        self.validate(doc)?;

        let mut stored = Dict::new();
        stored.insert(CLASS_KEY.to_string(), Value::String(self.name.clone()));
        for (name, field) in &self.fields {
            match doc.get(name) {
                Some(value) if !value.is_null() => {
                    let value = field.to_storage(value).map_err(|e| e.for_field(name))?;
                    stored.insert(name.clone(), value);
                }
                _ => {}
            }
        }
        for key in doc.values().keys().filter(|k| !self.fields.contains_key(*k)) {
            warn!(document_type = %self.name, field = %key, "dropping undeclared field");
        }
        Ok(stored)
    }

    /// Rebuild a document from its stored dictionary.
    pub fn from_storage(&self, mut stored: Dict) -> Result<EmbeddedDocument> {
        if let Some(class) = stored.shift_remove(CLASS_KEY) {
            if class.as_str() != Some(self.name.as_str()) {
                return Err(FieldError::invalid(format!(
                    "Stored document has type {class}, expected {}",
                    self.name
                )));
            }
        }

        let mut doc = self.new_document();
        for (key, value) in stored {
            match self.fields.get(&key) {
                Some(field) => {
                    let value = field.from_storage(value).map_err(|e| e.for_field(&key))?;
                    doc.set(key, value);
                }
                None if self.strict => return Err(self.unknown_field(&key)),
                None => {
                    warn!(document_type = %self.name, field = %key, "dropping unknown stored field");
                }
            }
        }
        Ok(doc)
    }
}

type TypeMap = DashMap<String, Arc<DocumentType>>;

/// Registry of document types, shared by cheap clones.
#[derive(Clone, Default)]
pub struct DocumentRegistry {
    types: Arc<TypeMap>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document type. Names must be unique.
    pub fn register(&self, doc_type: DocumentType) -> Result<Arc<DocumentType>> {
        match self.types.entry(doc_type.name.clone()) {
            Entry::Occupied(_) => Err(FieldError::DuplicateDocumentType {
                name: doc_type.name,
            }),
            Entry::Vacant(slot) => {
                debug!(
                    name = %doc_type.name,
                    fields = doc_type.fields.len(),
                    "registered document type"
                );
                let doc_type = Arc::new(doc_type);
                slot.insert(Arc::clone(&doc_type));
                Ok(doc_type)
            }
        }
    }

    /// Look up a registered type by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<DocumentType>> {
        self.types
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| FieldError::UnknownDocumentType {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// An embedded document field resolving `document_type` through this registry.
    pub fn embedded_field(&self, document_type: impl Into<String>) -> EmbeddedDocumentField {
        EmbeddedDocumentField::new(document_type, self)
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Arc::downgrade(&self.types))
    }
}

impl fmt::Debug for DocumentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRegistry")
            .field("types", &self.names())
            .finish()
    }
}

/// Non-owning registry handle held by embedded document fields.
///
/// Registered types own their fields, so a strong handle here would form a
/// reference cycle through the registry.
#[derive(Clone, Default)]
pub(crate) struct WeakRegistry(Weak<TypeMap>);

impl WeakRegistry {
    pub(crate) fn resolve(&self, name: &str) -> Result<Arc<DocumentType>> {
        let types = self
            .0
            .upgrade()
            .ok_or_else(|| FieldError::UnknownDocumentType {
                name: name.to_string(),
            })?;
        DocumentRegistry { types }.resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FloatField, ListField, StringField};

    fn detection() -> DocumentType {
        DocumentType::new("Detection")
            .field("label", StringField::new())
            .field("confidence", FloatField::new().with_min(0.0).with_max(1.0))
            .field("tags", ListField::new(Some(StringField::new().into())))
    }

    #[test]
    fn new_document_fills_container_defaults() {
        let doc = detection().new_document();
        assert_eq!(doc.get("tags"), Some(&Value::List(vec![])));
        assert_eq!(doc.get("label"), None);
    }

    #[test]
    fn storage_round_trip() {
        let doc_type = detection();
        let doc = doc_type
            .new_document()
            .with("label", "cat")
            .with("confidence", 0.9);
        let stored = doc_type.to_storage(&doc).unwrap();
        let keys: Vec<_> = stored.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_cls", "label", "confidence", "tags"]);
        assert_eq!(doc_type.from_storage(stored).unwrap(), doc);
    }

    #[test]
    fn validation_errors_name_the_field() {
        let doc_type = detection();
        let doc = EmbeddedDocument::new("Detection").with("confidence", 2.0);
        match doc_type.validate(&doc).unwrap_err() {
            FieldError::ValidationFailed { field, message } => {
                assert_eq!(field, "confidence");
                assert_eq!(message, "Float value is too large");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn strict_types_reject_unknown_fields() {
        let doc = EmbeddedDocument::new("Detection").with("color", "red");
        assert!(matches!(
            detection().validate(&doc),
            Err(FieldError::UnknownField { .. })
        ));

        let mut stored = Dict::new();
        stored.insert("color".into(), Value::from("red"));
        assert!(detection().from_storage(stored).is_err());
    }

    #[test_log::test]
    fn lenient_types_drop_unknown_fields() {
        let doc_type = detection().strict(false);
        let doc = EmbeddedDocument::new("Detection")
            .with("label", "dog")
            .with("color", "red");
        let stored = doc_type.to_storage(&doc).unwrap();
        assert!(!stored.contains_key("color"));

        let mut stored = stored;
        stored.insert("color".into(), Value::from("red"));
        let loaded = doc_type.from_storage(stored).unwrap();
        assert_eq!(loaded.get("color"), None);
        assert_eq!(loaded.get("label"), Some(&Value::from("dog")));
    }

    #[test]
    fn mismatched_class_is_rejected() {
        let mut stored = Dict::new();
        stored.insert(CLASS_KEY.into(), Value::from("Classification"));
        let err = detection().from_storage(stored).unwrap_err();
        assert!(err.message().unwrap().contains("expected Detection"));
    }

    #[test]
    fn wrong_document_type_is_rejected() {
        let doc = EmbeddedDocument::new("Classification");
        assert!(detection().validate(&doc).is_err());
    }

    #[test_log::test]
    fn registry_register_and_resolve() {
        let registry = DocumentRegistry::new();
        assert!(registry.is_empty());
        registry.register(detection()).unwrap();
        registry
            .register(DocumentType::new("Classification").field("label", StringField::new()))
            .unwrap();

        assert!(registry.contains("Detection"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["Classification", "Detection"]);
        assert_eq!(registry.resolve("Detection").unwrap().fields().len(), 3);
        assert!(matches!(
            registry.resolve("Polyline"),
            Err(FieldError::UnknownDocumentType { .. })
        ));
    }

    #[test]
    fn registry_rejects_duplicates() {
        let registry = DocumentRegistry::new();
        registry.register(detection()).unwrap();
        assert!(matches!(
            registry.register(detection()),
            Err(FieldError::DuplicateDocumentType { .. })
        ));
    }

    #[test]
    fn clones_share_registrations() {
        let registry = DocumentRegistry::new();
        let clone = registry.clone();
        clone.register(detection()).unwrap();
        assert!(registry.contains("Detection"));
    }

    #[test]
    fn weak_handle_fails_once_registry_is_dropped() {
        let weak = {
            let registry = DocumentRegistry::new();
            registry.register(detection()).unwrap();
            registry.downgrade()
        };
        assert!(matches!(
            weak.resolve("Detection"),
            Err(FieldError::UnknownDocumentType { .. })
        ));
    }
}

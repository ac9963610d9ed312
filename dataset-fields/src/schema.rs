//! Declarative document type definitions.
//!
//! Document types can be written in YAML and built into descriptors:
//!
//! ```yaml
//! name: Detection
//! fields:
//!   label: { kind: string }
//!   confidence: { kind: float, min_value: 0.0, max_value: 1.0 }
//!   tags: { kind: list, field: { kind: string } }
//!   mask: { kind: array }
//! ```
//!
//! Unknown kinds fail with `InvalidFieldType`; options that do not fit the
//! kind fail with `InvalidFieldConfig`.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::codec::ArrayCodec;
use crate::config::FieldsConfig;
use crate::document::{DocumentRegistry, DocumentType};
use crate::error::{FieldError, Result};
use crate::fields::{
    ArrayField, BooleanField, DictField, Field, FloatField, ImageLabelsField, IntField, ListField,
    StringField, VectorField,
};

/// Declaration of a single field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldSchema {
    pub kind: String,
    /// Element field of a `list`, value field of a `dict`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Box<FieldSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<i32>,
}

impl FieldSchema {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    fn config_error(&self, message: impl Into<String>) -> FieldError {
        FieldError::InvalidFieldConfig {
            kind: self.kind.clone(),
            message: message.into(),
        }
    }

    fn reject(&self, present: bool, option: &str) -> Result<()> {
        if present {
            return Err(self.config_error(format!("'{option}' does not apply")));
        }
        Ok(())
    }

    fn check_options(&self) -> Result<()> {
        let kind = self.kind.as_str();
        self.reject(self.field.is_some() && !matches!(kind, "list" | "dict"), "field")?;
        self.reject(
            (self.min_value.is_some() || self.max_value.is_some())
                && !matches!(kind, "int" | "float"),
            "min_value/max_value",
        )?;
        self.reject(
            (self.min_length.is_some() || self.max_length.is_some() || self.regex.is_some())
                && kind != "string",
            "min_length/max_length/regex",
        )?;
        self.reject(
            self.document_type.is_some() && kind != "embedded-document",
            "document_type",
        )?;
        self.reject(
            self.compression_level.is_some() && kind != "array",
            "compression_level",
        )
    }

    /// Build the element field of a container, which must be a known kind.
    fn build_element(
        &self,
        registry: &DocumentRegistry,
        config: &FieldsConfig,
    ) -> Result<Option<Field>> {
        self.field
            .as_deref()
            .map(|element| element.build(registry, config))
            .transpose()
    }

    /// Build the descriptor this schema declares.
    pub fn build(&self, registry: &DocumentRegistry, config: &FieldsConfig) -> Result<Field> {
        self.check_options()?;
        let field: Field = match self.kind.as_str() {
            "boolean" => BooleanField::new().into(),
            "int" => {
                let mut field = IntField::new();
                if let Some(min) = self.min_value {
                    field = field.with_min(integer_bound(self, min)?);
                }
                if let Some(max) = self.max_value {
                    field = field.with_max(integer_bound(self, max)?);
                }
                field.into()
            }
            "float" => {
                let mut field = FloatField::new();
                if let Some(min) = self.min_value {
                    field = field.with_min(min);
                }
                if let Some(max) = self.max_value {
                    field = field.with_max(max);
                }
                field.into()
            }
            "string" => {
                let mut field = StringField::new();
                if let Some(min) = self.min_length {
                    field = field.with_min_length(min);
                }
                if let Some(max) = self.max_length {
                    field = field.with_max_length(max);
                }
                if let Some(pattern) = &self.regex {
                    field = field.with_regex(pattern)?;
                }
                field.into()
            }
            "list" => ListField::new(self.build_element(registry, config)?).into(),
            "dict" => DictField::new(self.build_element(registry, config)?).into(),
            "vector" => VectorField::new().into(),
            "array" => {
                let level = self.compression_level.unwrap_or(config.compression_level);
                ArrayField::with_codec(ArrayCodec::new(level)).into()
            }
            "image-labels" => ImageLabelsField::new().into(),
            "embedded-document" => {
                let name = self
                    .document_type
                    .as_deref()
                    .ok_or_else(|| self.config_error("'document_type' is required"))?;
                registry.embedded_field(name).into()
            }
            other => {
                return Err(FieldError::InvalidFieldType {
                    found: other.to_string(),
                })
            }
        };
        trace!(kind = %self.kind, field = %field, "built field");
        Ok(field)
    }
}

fn integer_bound(schema: &FieldSchema, bound: f64) -> Result<i64> {
    if bound.fract() != 0.0 || !bound.is_finite() {
        return Err(schema.config_error(format!("{bound} is not an integer bound")));
    }
    // i64 spans [-2^63, 2^63)
    if !(-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&bound) {
        return Err(schema.config_error(format!("{bound} is outside the integer range")));
    }
    Ok(bound as i64)
}

/// Declaration of a document type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldSchema>,
}

impl DocumentSchema {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Build the document type, naming any field that fails to build.
    pub fn build(
        &self,
        registry: &DocumentRegistry,
        config: &FieldsConfig,
    ) -> Result<DocumentType> {
        let mut doc_type = DocumentType::new(&self.name)
            .strict(self.strict.unwrap_or(config.strict_documents));
        for (name, schema) in &self.fields {
            let field = schema
                .build(registry, config)
                .map_err(|e| match e {
                    FieldError::InvalidFieldConfig { kind, message } => {
                        FieldError::InvalidFieldConfig {
                            kind,
                            message: format!("field '{name}': {message}"),
                        }
                    }
                    other => other,
                })?;
            doc_type = doc_type.field(name.clone(), field);
        }
        Ok(doc_type)
    }
}

impl DocumentRegistry {
    /// Parse, build and register a YAML document type definition.
    pub fn register_yaml(&self, yaml: &str, config: &FieldsConfig) -> Result<Arc<DocumentType>> {
        let schema = DocumentSchema::from_yaml(yaml)?;
        self.register(schema.build(self, config)?)
    }
}

//! Typed field descriptors for dataset samples
//!
//! `dataset-fields` declares the attributes a record may carry and how each one
//! is validated and converted between its in-memory form and the plain storage
//! form a document database persists.
//!
//! # Architecture
//!
//! - **Descriptors**: every field type implements [`FieldDescriptor`]; [`Field`] holds any of them
//! - **Storage values**: [`Value`] is the tagged union passed across the storage boundary
//! - **Arrays**: n-dimensional arrays are stored as compressed binary blobs by [`ArrayCodec`]
//! - **Documents**: [`DocumentType`]s are registered by name in a [`DocumentRegistry`] and
//!   embedded in other records through [`EmbeddedDocumentField`]
//! - **YAML schemas**: [`DocumentSchema`] builds document types from declarative definitions
//! - **Configuration**: [`FieldsConfig`] is layered from defaults, a file, and the environment

pub mod array;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod labels;
pub mod schema;
pub mod value;

pub use array::{DType, NdArray};
pub use codec::{ArrayCodec, DEFAULT_COMPRESSION_LEVEL};
pub use config::FieldsConfig;
pub use document::{DocumentRegistry, DocumentType, EmbeddedDocument, CLASS_KEY};
pub use error::{FieldError, Result};
pub use fields::{
    ArrayField, BooleanField, DictField, EmbeddedDocumentField, Field, FieldDescriptor,
    FloatField, ImageLabelsField, IntField, ListField, StringField, VectorField,
};
pub use labels::{
    Attribute, BoundingBox, DetectedObject, ImageLabels, ImageMetadata, RelativePoint,
};
pub use schema::{DocumentSchema, FieldSchema};
pub use value::{Dict, Value};

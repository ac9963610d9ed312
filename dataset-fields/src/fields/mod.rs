//! Field descriptors.
//!
//! A field descriptor governs one named attribute of a record: it validates
//! values assigned to the attribute and converts them between their
//! in-memory and stored forms. Every descriptor implements
//! [`FieldDescriptor`]; [`Field`] wraps any of them so containers and
//! documents can hold heterogeneous descriptors.
//!
//! `Null` is the unset value. Every descriptor passes it through both
//! conversions unchanged and accepts it during validation.

use std::fmt;

use crate::error::Result;
use crate::value::Value;

/// Shared `Display` body for descriptors that only render their type name.
macro_rules! display_as {
    ($ty:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(stringify!($ty))
            }
        }
    };
}

mod container;
mod embedded;
mod labels;
mod numeric;
mod scalar;

pub use container::{DictField, ListField};
pub use embedded::EmbeddedDocumentField;
pub use labels::ImageLabelsField;
pub use numeric::{ArrayField, VectorField};
pub use scalar::{BooleanField, FloatField, IntField, StringField};

/// The conversion and validation contract shared by all field types.
///
/// `Display` renders the human-readable name, e.g. `ListField(FloatField)`.
pub trait FieldDescriptor: fmt::Display + fmt::Debug + Send + Sync {
    /// Convert an in-memory value to its stored form.
    fn to_storage(&self, value: &Value) -> Result<Value>;

    /// Convert a stored value back to its in-memory form.
    fn from_storage(&self, value: Value) -> Result<Value>;

    /// Check that a value may be assigned to this field.
    fn validate(&self, value: &Value) -> Result<()>;

    /// Value used when the attribute has never been set.
    fn default_value(&self) -> Value {
        Value::Null
    }
}

/// Any field descriptor.
#[derive(Debug, Clone)]
pub enum Field {
    Boolean(BooleanField),
    Int(IntField),
    Float(FloatField),
    String(StringField),
    List(ListField),
    Dict(DictField),
    Vector(VectorField),
    Array(ArrayField),
    ImageLabels(ImageLabelsField),
    EmbeddedDocument(EmbeddedDocumentField),
}

impl Field {
    fn descriptor(&self) -> &dyn FieldDescriptor {
        match self {
            Field::Boolean(f) => f,
            Field::Int(f) => f,
            Field::Float(f) => f,
            Field::String(f) => f,
            Field::List(f) => f,
            Field::Dict(f) => f,
            Field::Vector(f) => f,
            Field::Array(f) => f,
            Field::ImageLabels(f) => f,
            Field::EmbeddedDocument(f) => f,
        }
    }

    /// Type name without element details, e.g. `ListField`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Field::Boolean(_) => "BooleanField",
            Field::Int(_) => "IntField",
            Field::Float(_) => "FloatField",
            Field::String(_) => "StringField",
            Field::List(_) => "ListField",
            Field::Dict(_) => "DictField",
            Field::Vector(_) => "VectorField",
            Field::Array(_) => "ArrayField",
            Field::ImageLabels(_) => "ImageLabelsField",
            Field::EmbeddedDocument(_) => "EmbeddedDocumentField",
        }
    }
}

impl FieldDescriptor for Field {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        self.descriptor().to_storage(value)
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        self.descriptor().from_storage(value)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        self.descriptor().validate(value)
    }

    fn default_value(&self) -> Value {
        self.descriptor().default_value()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.descriptor(), f)
    }
}

macro_rules! impl_into_field {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Field {
                fn from(field: $ty) -> Self {
                    Field::$variant(field)
                }
            }
        )*
    };
}

impl_into_field!(
    BooleanField => Boolean,
    IntField => Int,
    FloatField => Float,
    StringField => String,
    ListField => List,
    DictField => Dict,
    VectorField => Vector,
    ArrayField => Array,
    ImageLabelsField => ImageLabels,
    EmbeddedDocumentField => EmbeddedDocument,
);

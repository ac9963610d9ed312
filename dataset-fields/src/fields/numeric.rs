//! Numeric array fields: 1-D vectors stored as lists, n-D arrays stored as blobs.

use tracing::trace;

use super::FieldDescriptor;
use crate::array::{exact_in_f64, inexact_integer, NdArray};
use crate::codec::ArrayCodec;
use crate::error::{FieldError, Result};
use crate::value::Value;

/// A one-dimensional array field.
///
/// Accepts lists and 1-D numeric arrays. The data is stored as a list of
/// numbers and always retrieved as a 1-D `float64` array.
#[derive(Debug, Clone, Default)]
pub struct VectorField;

impl VectorField {
    pub fn new() -> Self {
        Self
    }
}

display_as!(VectorField);

impl FieldDescriptor for VectorField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        self.validate(value)?;
        match value {
            Value::Array(array) => Ok(Value::List(array.to_scalars())),
            other => Ok(other.clone()),
        }
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null | Value::Array(_) => Ok(value),
            Value::List(items) => Ok(Value::Array(NdArray::vector_from_scalars(&items)?)),
            other => Err(FieldError::invalid(format!(
                "cannot read a vector from {} value",
                other.type_name()
            ))),
        }
    }

    fn validate(&self, value: &Value) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::Array(array) if array.ndim() > 1 => Err(FieldError::invalid(
                "Only 1D arrays may be used in a vector field",
            )),
            Value::Array(array) => match array.first_inexact_integer() {
                Some(i) => Err(inexact_integer(i)),
                None => Ok(()),
            },
            Value::List(items) => {
                for item in items {
                    match item {
                        Value::Int(i) if !exact_in_f64(*i) => return Err(inexact_integer(*i)),
                        _ if item.as_number().is_none() => {
                            return Err(FieldError::invalid(format!(
                                "Vector elements must be numbers, found {}",
                                item.type_name()
                            )))
                        }
                        _ => {}
                    }
                }
                Ok(())
            }
            _ => Err(FieldError::invalid(
                "Only numeric arrays and lists may be used in a vector field",
            )),
        }
    }
}

/// An n-dimensional array field.
///
/// Accepts numeric arrays. The data is serialized by [`ArrayCodec`] into a
/// compressed blob and always retrieved as a numeric array.
#[derive(Debug, Clone, Default)]
pub struct ArrayField {
    codec: ArrayCodec,
}

impl ArrayField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(codec: ArrayCodec) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &ArrayCodec {
        &self.codec
    }
}

display_as!(ArrayField);

impl FieldDescriptor for ArrayField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null | Value::Binary(_) => Ok(value.clone()),
            Value::Array(array) => Ok(Value::Binary(self.codec.serialize(array)?)),
            _ => Err(FieldError::invalid(
                "Only numeric arrays may be used in an array field",
            )),
        }
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null | Value::Array(_) => Ok(value),
            Value::Binary(blob) => {
                let array = self.codec.deserialize(&blob)?;
                trace!(dtype = %array.dtype(), shape = ?array.shape(), "loaded array");
                Ok(Value::Array(array))
            }
            other => Err(FieldError::invalid(format!(
                "cannot read an array from {} value",
                other.type_name()
            ))),
        }
    }

    fn validate(&self, value: &Value) -> Result<()> {
        match value {
            Value::Null | Value::Array(_) | Value::Binary(_) => Ok(()),
            _ => Err(FieldError::invalid(
                "Only numeric arrays may be used in an array field",
            )),
        }
    }
}

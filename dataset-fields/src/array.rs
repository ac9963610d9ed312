//! Dtype-tagged n-dimensional numeric arrays.
//!
//! Field values that hold numeric arrays carry an [`NdArray`], which pairs an
//! `ndarray::ArrayD` with its element type so the dtype survives storage.

use std::fmt;

use ndarray::{Array, Array1, ArrayD, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};
use crate::value::Value;

/// Element type of an [`NdArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    UInt8,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    pub fn is_integer(self) -> bool {
        matches!(self, DType::UInt8 | DType::Int32 | DType::Int64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::UInt8 => "uint8",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// An n-dimensional numeric array of one of the supported dtypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NdArray {
    UInt8(ArrayD<u8>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
}

macro_rules! each_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            NdArray::UInt8($arr) => $body,
            NdArray::Int32($arr) => $body,
            NdArray::Int64($arr) => $body,
            NdArray::Float32($arr) => $body,
            NdArray::Float64($arr) => $body,
        }
    };
}

impl NdArray {
    pub fn dtype(&self) -> DType {
        match self {
            NdArray::UInt8(_) => DType::UInt8,
            NdArray::Int32(_) => DType::Int32,
            NdArray::Int64(_) => DType::Int64,
            NdArray::Float32(_) => DType::Float32,
            NdArray::Float64(_) => DType::Float64,
        }
    }

    pub fn ndim(&self) -> usize {
        each_array!(self, a => a.ndim())
    }

    pub fn shape(&self) -> &[usize] {
        each_array!(self, a => a.shape())
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        each_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in logical (row-major) order as scalar values.
    ///
    /// Integer dtypes produce `Value::Int`, float dtypes `Value::Float`.
    pub fn to_scalars(&self) -> Vec<Value> {
        match self {
            NdArray::UInt8(a) => a.iter().map(|&v| Value::Int(i64::from(v))).collect(),
            NdArray::Int32(a) => a.iter().map(|&v| Value::Int(i64::from(v))).collect(),
            NdArray::Int64(a) => a.iter().map(|&v| Value::Int(v)).collect(),
            NdArray::Float32(a) => a.iter().map(|&v| Value::Float(f64::from(v))).collect(),
            NdArray::Float64(a) => a.iter().map(|&v| Value::Float(v)).collect(),
        }
    }

    /// First `int64` element that has no exact `float64` representation.
    pub fn first_inexact_integer(&self) -> Option<i64> {
        match self {
            NdArray::Int64(a) => a.iter().copied().find(|&v| !exact_in_f64(v)),
            _ => None,
        }
    }

    /// Build a 1-D `float64` array from a sequence of numbers.
    ///
    /// Integers that would change value in `float64` are rejected.
    pub fn vector_from_scalars(values: &[Value]) -> Result<Self> {
        let data = values
            .iter()
            .map(|v| match v {
                Value::Int(i) if !exact_in_f64(*i) => Err(inexact_integer(*i)),
                _ => v
                    .as_number()
                    .ok_or_else(|| FieldError::invalid(format!("{v} is not a number"))),
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(NdArray::Float64(Array1::from(data).into_dyn()))
    }
}

/// Whether `value` survives a round trip through `f64` unchanged.
pub(crate) fn exact_in_f64(value: i64) -> bool {
    let float = value as f64;
    // 2^63 saturates back to i64::MAX
    float < 9_223_372_036_854_775_808.0 && float as i64 == value
}

pub(crate) fn inexact_integer(value: i64) -> FieldError {
    FieldError::invalid(format!(
        "Vector element {value} cannot be represented exactly as a float"
    ))
}

macro_rules! impl_from_array {
    ($elem:ty, $variant:ident) => {
        impl<D: Dimension> From<Array<$elem, D>> for NdArray {
            fn from(array: Array<$elem, D>) -> Self {
                NdArray::$variant(array.into_dyn())
            }
        }
    };
}

impl_from_array!(u8, UInt8);
impl_from_array!(i32, Int32);
impl_from_array!(i64, Int64);
impl_from_array!(f32, Float32);
impl_from_array!(f64, Float64);

//! Scalar fields: booleans, integers, floats and strings.

use regex::Regex;

use super::FieldDescriptor;
use crate::error::{FieldError, Result};
use crate::value::Value;

/// A boolean field.
#[derive(Debug, Clone, Default)]
pub struct BooleanField;

impl BooleanField {
    pub fn new() -> Self {
        Self
    }
}

display_as!(BooleanField);

impl FieldDescriptor for BooleanField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        self.validate(value)?;
        Ok(value.clone())
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null | Value::Bool(_) => Ok(value),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            other => Err(FieldError::invalid(format!(
                "{other} could not be converted to bool"
            ))),
        }
    }

    fn validate(&self, value: &Value) -> Result<()> {
        match value {
            Value::Null | Value::Bool(_) => Ok(()),
            _ => Err(FieldError::invalid("BooleanField only accepts boolean values")),
        }
    }
}

/// A 64 bit integer field with optional bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntField {
    min_value: Option<i64>,
    max_value: Option<i64>,
}

impl IntField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    pub fn with_max(mut self, max_value: i64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    pub fn min_value(&self) -> Option<i64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<i64> {
        self.max_value
    }

    fn coerce(value: &Value) -> Result<i64> {
        let unconvertible = || FieldError::invalid(format!("{value} could not be converted to int"));
        match value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            // 2^63 is exactly representable, so the upper bound is exclusive
            Value::Float(x) if x.is_finite() && *x >= i64::MIN as f64 && *x < i64::MAX as f64 => {
                Ok(x.trunc() as i64)
            }
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| unconvertible()),
            _ => Err(unconvertible()),
        }
    }
}

display_as!(IntField);

impl FieldDescriptor for IntField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            other => Ok(Value::Int(Self::coerce(other)?)),
        }
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        self.to_storage(&value)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let value = Self::coerce(value)?;
        if matches!(self.min_value, Some(min) if value < min) {
            return Err(FieldError::invalid("Integer value is too small"));
        }
        if matches!(self.max_value, Some(max) if value > max) {
            return Err(FieldError::invalid("Integer value is too large"));
        }
        Ok(())
    }
}

/// A floating point number field with optional bounds.
///
/// Conversion failures and out-of-bound values are reported as field errors.
/// A string that only reaches infinity by overflowing, such as `"1e999"`, is
/// rejected as too large; spelled-out `"inf"` and `"infinity"` are accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatField {
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl FloatField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(mut self, min_value: f64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    pub fn with_max(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    fn coerce(value: &Value) -> Result<f64> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => parse_float(s),
            other => Err(FieldError::invalid(format!(
                "{other} could not be converted to float"
            ))),
        }
    }
}

fn parse_float(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(x) if x.is_infinite() && !spells_infinity(trimmed) => Err(FieldError::invalid(
            "The value is too large to be converted to float",
        )),
        Ok(x) => Ok(x),
        Err(_) => Err(FieldError::invalid(format!(
            "{text} could not be converted to float"
        ))),
    }
}

fn spells_infinity(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']).to_ascii_lowercase();
    unsigned == "inf" || unsigned == "infinity"
}

display_as!(FloatField);

impl FieldDescriptor for FloatField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            other => Ok(Value::Float(Self::coerce(other)?)),
        }
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        self.to_storage(&value)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let value = Self::coerce(value)?;
        if matches!(self.min_value, Some(min) if value < min) {
            return Err(FieldError::invalid("Float value is too small"));
        }
        if matches!(self.max_value, Some(max) if value > max) {
            return Err(FieldError::invalid("Float value is too large"));
        }
        Ok(())
    }
}

/// A unicode string field with optional length and pattern constraints.
#[derive(Debug, Clone, Default)]
pub struct StringField {
    min_length: Option<usize>,
    max_length: Option<usize>,
    regex: Option<Regex>,
}

impl StringField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Require values to match `pattern`. Fails if the pattern does not compile.
    pub fn with_regex(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| FieldError::InvalidFieldConfig {
            kind: "string".into(),
            message: e.to_string(),
        })?;
        self.regex = Some(regex);
        Ok(self)
    }
}

display_as!(StringField);

impl FieldDescriptor for StringField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null | Value::String(_) => Ok(value.clone()),
            _ => Err(FieldError::invalid("StringField only accepts string values")),
        }
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        self.to_storage(&value)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        let text = match value {
            Value::Null => return Ok(()),
            Value::String(s) => s,
            _ => return Err(FieldError::invalid("StringField only accepts string values")),
        };
        let length = text.chars().count();
        if matches!(self.min_length, Some(min) if length < min) {
            return Err(FieldError::invalid("String value is too short"));
        }
        if matches!(self.max_length, Some(max) if length > max) {
            return Err(FieldError::invalid("String value is too long"));
        }
        if let Some(regex) = &self.regex {
            if !regex.is_match(text) {
                return Err(FieldError::invalid(
                    "String value did not match validation regex",
                ));
            }
        }
        Ok(())
    }
}

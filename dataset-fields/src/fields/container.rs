//! List and dict fields wrapping an optional element field.

use std::fmt;

use super::{Field, FieldDescriptor};
use crate::error::{FieldError, Result};
use crate::value::{Dict, Value};

/// Elements stored without a declared field must already be storable.
fn check_untyped(item: &Value) -> Result<()> {
    if item.is_storage() {
        Ok(())
    } else {
        Err(FieldError::invalid(format!(
            "{} values require a declared element field",
            item.type_name()
        )))
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.contains('.') || key.starts_with('$') {
        return Err(FieldError::invalid(
            "Invalid dictionary key name - keys may not contain \".\" or startswith \"$\" characters",
        ));
    }
    Ok(())
}

fn write_name(f: &mut fmt::Formatter<'_>, kind: &str, field: Option<&Field>) -> fmt::Result {
    match field {
        Some(inner) => write!(f, "{kind}({})", inner.kind_name()),
        None => f.write_str(kind),
    }
}

/// A list of values, optionally typed by an element field.
///
/// If this field is not set, its default value is `[]`.
#[derive(Debug, Clone, Default)]
pub struct ListField {
    field: Option<Box<Field>>,
}

impl ListField {
    pub fn new(field: Option<Field>) -> Self {
        Self {
            field: field.map(Box::new),
        }
    }

    /// The element field, if one was declared.
    pub fn field(&self) -> Option<&Field> {
        self.field.as_deref()
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(f, "ListField", self.field())
    }
}

impl FieldDescriptor for ListField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        let items = match value {
            Value::Null => return Ok(Value::Null),
            Value::List(items) => items,
            _ => return Err(FieldError::invalid("Only lists may be used in a list field")),
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match self.field() {
                Some(field) => field.to_storage(item).map_err(|e| e.for_field(&i.to_string())),
                None => check_untyped(item).map(|_| item.clone()),
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        let items = match value {
            Value::List(items) => items,
            Value::Null => return Ok(Value::Null),
            _ => return Err(FieldError::invalid("Only lists may be used in a list field")),
        };
        let Some(field) = self.field() else {
            return Ok(Value::List(items));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| field.from_storage(item).map_err(|e| e.for_field(&i.to_string())))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        let items = match value {
            Value::Null => return Ok(()),
            Value::List(items) => items,
            _ => return Err(FieldError::invalid("Only lists may be used in a list field")),
        };
        for (i, item) in items.iter().enumerate() {
            let checked = match self.field() {
                Some(field) => field.validate(item),
                None => check_untyped(item),
            };
            checked.map_err(|e| e.for_field(&i.to_string()))?;
        }
        Ok(())
    }

    fn default_value(&self) -> Value {
        Value::List(Vec::new())
    }
}

/// A string-keyed mapping, optionally typed by a value field.
///
/// If this field is not set, its default value is `{}`.
#[derive(Debug, Clone, Default)]
pub struct DictField {
    field: Option<Box<Field>>,
}

impl DictField {
    pub fn new(field: Option<Field>) -> Self {
        Self {
            field: field.map(Box::new),
        }
    }

    /// The value field, if one was declared.
    pub fn field(&self) -> Option<&Field> {
        self.field.as_deref()
    }
}

impl fmt::Display for DictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(f, "DictField", self.field())
    }
}

impl FieldDescriptor for DictField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        let map = match value {
            Value::Null => return Ok(Value::Null),
            Value::Dict(map) => map,
            _ => return Err(FieldError::invalid("Only dictionaries may be used in a DictField")),
        };
        map.iter()
            .map(|(key, item)| {
                let stored = match self.field() {
                    Some(field) => field.to_storage(item).map_err(|e| e.for_field(key))?,
                    None => {
                        check_untyped(item).map_err(|e| e.for_field(key))?;
                        item.clone()
                    }
                };
                Ok((key.clone(), stored))
            })
            .collect::<Result<Dict>>()
            .map(Value::Dict)
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        let map = match value {
            Value::Dict(map) => map,
            Value::Null => return Ok(Value::Null),
            _ => return Err(FieldError::invalid("Only dictionaries may be used in a DictField")),
        };
        let Some(field) = self.field() else {
            return Ok(Value::Dict(map));
        };
        map.into_iter()
            .map(|(key, item)| {
                let loaded = field.from_storage(item).map_err(|e| e.for_field(&key))?;
                Ok((key, loaded))
            })
            .collect::<Result<Dict>>()
            .map(Value::Dict)
    }

    fn validate(&self, value: &Value) -> Result<()> {
        let map = match value {
            Value::Null => return Ok(()),
            Value::Dict(map) => map,
            _ => return Err(FieldError::invalid("Only dictionaries may be used in a DictField")),
        };
        for (key, item) in map {
            check_key(key)?;
            let checked = match self.field() {
                Some(field) => field.validate(item),
                None => check_untyped(item),
            };
            checked.map_err(|e| e.for_field(key))?;
        }
        Ok(())
    }

    fn default_value(&self) -> Value {
        Value::Dict(Dict::new())
    }
}

//! The field that stores per-image annotations.

use super::FieldDescriptor;
use crate::error::{FieldError, Result};
use crate::labels::ImageLabels;
use crate::value::Value;

/// A field that stores an [`ImageLabels`] instance.
///
/// Accepts `ImageLabels` values or their dict form. The data is stored as a
/// dictionary and always retrieved as `ImageLabels`.
#[derive(Debug, Clone, Default)]
pub struct ImageLabelsField;

impl ImageLabelsField {
    pub fn new() -> Self {
        Self
    }
}

display_as!(ImageLabelsField);

fn wrong_type() -> FieldError {
    FieldError::invalid("Only dicts and ImageLabels instances may be used in an ImageLabels field")
}

impl FieldDescriptor for ImageLabelsField {
    fn to_storage(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::ImageLabels(labels) => Ok(Value::Dict(labels.to_dict()?)),
            Value::Dict(dict) => Ok(Value::Dict(ImageLabels::from_dict(dict)?.to_dict()?)),
            _ => Err(wrong_type()),
        }
    }

    fn from_storage(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null | Value::ImageLabels(_) => Ok(value),
            Value::Dict(dict) => Ok(Value::from(ImageLabels::from_dict(&dict)?)),
            _ => Err(wrong_type()),
        }
    }

    fn validate(&self, value: &Value) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::ImageLabels(labels) => labels.check_finite(),
            Value::Dict(dict) => ImageLabels::from_dict(dict)
                .map(|_| ())
                .map_err(|e| FieldError::invalid(format!("Invalid ImageLabels dict: {e}"))),
            _ => Err(wrong_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{BoundingBox, DetectedObject};
    use crate::value::Dict;

    fn labels() -> ImageLabels {
        let mut labels = ImageLabels::new();
        labels.add_object(
            DetectedObject::new("person", BoundingBox::from_coords(0.0, 0.0, 0.5, 1.0))
                .with_confidence(0.75),
        );
        labels
    }

    #[test]
    fn labels_round_trip_through_storage() {
        let field = ImageLabelsField::new();
        let value = Value::from(labels());
        field.validate(&value).unwrap();
        let stored = field.to_storage(&value).unwrap();
        assert!(matches!(stored, Value::Dict(_)));
        assert_eq!(field.from_storage(stored).unwrap(), value);
    }

    #[test]
    fn dict_values_are_accepted_and_normalized() {
        let field = ImageLabelsField::new();
        let dict = labels().to_dict().unwrap();
        let value = Value::Dict(dict.clone());
        field.validate(&value).unwrap();
        assert_eq!(field.to_storage(&value).unwrap(), Value::Dict(dict));
        assert_eq!(field.from_storage(value).unwrap(), Value::from(labels()));
    }

    #[test]
    fn non_finite_labels_are_never_stored() {
        let field = ImageLabelsField::new();

        let mut nan_box = ImageLabels::new();
        nan_box.add_object(DetectedObject::new(
            "person",
            BoundingBox::from_coords(f64::NAN, 0.0, 1.0, 1.0),
        ));
        let value = Value::from(nan_box);
        assert!(field.validate(&value).is_err());
        assert!(field.to_storage(&value).is_err());

        let mut infinite = labels();
        infinite.objects[0].confidence = Some(f64::INFINITY);
        let value = Value::from(infinite);
        let err = field.validate(&value).unwrap_err();
        assert!(err.message().unwrap().contains("objects.0.confidence"));
        assert!(field.to_storage(&value).is_err());
    }

    #[test]
    fn other_types_are_rejected() {
        let err = ImageLabelsField::new()
            .validate(&Value::List(vec![]))
            .unwrap_err();
        assert!(err.message().unwrap().starts_with("Only dicts and ImageLabels"));
    }

    #[test]
    fn malformed_dicts_are_rejected() {
        let mut dict = Dict::new();
        dict.insert("objects".into(), Value::Int(3));
        let err = ImageLabelsField::new()
            .validate(&Value::Dict(dict))
            .unwrap_err();
        assert!(err.message().unwrap().starts_with("Invalid ImageLabels dict"));
    }
}

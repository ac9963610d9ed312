//! Image annotation payloads stored by `ImageLabelsField`.
//!
//! An [`ImageLabels`] describes one image: optional file and size metadata,
//! image-level attributes, and detected objects with relative bounding boxes.
//! Its storage form is a plain dictionary produced by [`ImageLabels::to_dict`].

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};
use crate::value::{Dict, Value};

/// A point in relative image coordinates, `[0, 1]` on both axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RelativePoint {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned box in relative coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub top_left: RelativePoint,
    pub bottom_right: RelativePoint,
}

impl BoundingBox {
    pub fn from_coords(tlx: f64, tly: f64, brx: f64, bry: f64) -> Self {
        Self {
            top_left: RelativePoint { x: tlx, y: tly },
            bottom_right: RelativePoint { x: brx, y: bry },
        }
    }

    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }
}

/// A named attribute of an image or object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Attribute {
    Categorical {
        name: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    Numeric {
        name: String,
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    Boolean {
        name: String,
        value: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Categorical { name, .. }
            | Attribute::Numeric { name, .. }
            | Attribute::Boolean { name, .. } => name,
        }
    }

    fn check_finite(&self, path: &str) -> Result<()> {
        let confidence = match self {
            Attribute::Numeric {
                value, confidence, ..
            } => {
                finite(*value, path, "value")?;
                confidence
            }
            Attribute::Categorical { confidence, .. } | Attribute::Boolean { confidence, .. } => {
                confidence
            }
        };
        match confidence {
            Some(c) => finite(*c, path, "confidence"),
            None => Ok(()),
        }
    }
}

fn finite(value: f64, path: &str, name: &str) -> Result<()> {
    if value.is_finite() {
        return Ok(());
    }
    Err(FieldError::invalid(format!(
        "ImageLabels {path}.{name} must be finite, found {value}"
    )))
}

/// Pixel dimensions of the annotated image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_channels: Option<u32>,
}

/// A detected object within an image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedObject {
    pub label: String,
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            label: label.into(),
            bounding_box,
            confidence: None,
            index: None,
            attrs: Vec::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_attr(mut self, attr: Attribute) -> Self {
        self.attrs.push(attr);
        self
    }
}

/// Labels for a single image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageLabels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<DetectedObject>,
}

impl ImageLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attribute(&mut self, attr: Attribute) {
        self.attrs.push(attr);
    }

    pub fn add_object(&mut self, object: DetectedObject) {
        self.objects.push(object);
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.objects.is_empty()
    }

    /// Fail on the first NaN or infinite number, which has no stored form.
    pub fn check_finite(&self) -> Result<()> {
        for (i, attr) in self.attrs.iter().enumerate() {
            attr.check_finite(&format!("attrs.{i}"))?;
        }
        for (i, object) in self.objects.iter().enumerate() {
            let path = format!("objects.{i}");
            let bbox = &object.bounding_box;
            finite(bbox.top_left.x, &path, "bounding_box.top_left.x")?;
            finite(bbox.top_left.y, &path, "bounding_box.top_left.y")?;
            finite(bbox.bottom_right.x, &path, "bounding_box.bottom_right.x")?;
            finite(bbox.bottom_right.y, &path, "bounding_box.bottom_right.y")?;
            if let Some(confidence) = object.confidence {
                finite(confidence, &path, "confidence")?;
            }
            for (j, attr) in object.attrs.iter().enumerate() {
                attr.check_finite(&format!("{path}.attrs.{j}"))?;
            }
        }
        Ok(())
    }

    /// Serialize to the dictionary form kept in the database.
    ///
    /// Labels holding non-finite numbers are rejected, see [`ImageLabels::check_finite`].
    pub fn to_dict(&self) -> Result<Dict> {
        self.check_finite()?;
        match Value::from(serde_json::to_value(self)?) {
            Value::Dict(map) => Ok(map),
            other => Err(FieldError::invalid(format!(
                "ImageLabels serialized to {} instead of a dict",
                other.type_name()
            ))),
        }
    }

    /// Rebuild labels from their dictionary form.
    pub fn from_dict(dict: &Dict) -> Result<Self> {
        let json = serde_json::Value::try_from(Value::Dict(dict.clone()))?;
        Ok(serde_json::from_value(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_labels() -> ImageLabels {
        let mut labels = ImageLabels::new();
        labels.filename = Some("000001.jpg".into());
        labels.metadata = Some(ImageMetadata {
            width: 640,
            height: 480,
            num_channels: Some(3),
        });
        labels.add_attribute(Attribute::Categorical {
            name: "weather".into(),
            value: "rain".into(),
            confidence: Some(0.8),
        });
        labels.add_object(
            DetectedObject::new("car", BoundingBox::from_coords(0.1, 0.2, 0.5, 0.6))
                .with_confidence(0.93)
                .with_attr(Attribute::Boolean {
                    name: "occluded".into(),
                    value: false,
                    confidence: None,
                }),
        );
        labels
    }

    #[test]
    fn dict_round_trip() {
        let labels = sample_labels();
        let dict = labels.to_dict().unwrap();
        assert_eq!(dict.get("filename"), Some(&Value::from("000001.jpg")));
        assert!(matches!(dict.get("objects"), Some(Value::List(items)) if items.len() == 1));
        assert_eq!(ImageLabels::from_dict(&dict).unwrap(), labels);
    }

    #[test]
    fn empty_labels_serialize_to_empty_dict() {
        let labels = ImageLabels::new();
        assert!(labels.is_empty());
        assert!(labels.to_dict().unwrap().is_empty());
    }

    #[test]
    fn attribute_type_tag_is_kebab_case() {
        let json = serde_json::to_value(Attribute::Numeric {
            name: "brightness".into(),
            value: 0.25,
            confidence: None,
        })
        .unwrap();
        assert_eq!(json["type"], "numeric");
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn malformed_dict_is_rejected() {
        let mut dict = Dict::new();
        dict.insert("objects".into(), Value::from("not a list"));
        assert!(ImageLabels::from_dict(&dict).is_err());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let mut labels = ImageLabels::new();
        labels.add_object(DetectedObject::new(
            "car",
            BoundingBox::from_coords(f64::NAN, 0.0, 1.0, 1.0),
        ));
        let err = labels.to_dict().unwrap_err();
        assert_eq!(
            err.message(),
            Some("ImageLabels objects.0.bounding_box.top_left.x must be finite, found NaN")
        );

        let mut labels = sample_labels();
        labels.objects[0].confidence = Some(f64::INFINITY);
        assert!(labels.to_dict().is_err());

        let mut labels = sample_labels();
        labels.add_attribute(Attribute::Numeric {
            name: "brightness".into(),
            value: f64::NEG_INFINITY,
            confidence: None,
        });
        let err = labels.check_finite().unwrap_err();
        assert!(err.message().unwrap().starts_with("ImageLabels attrs.1.value"));
    }

    #[test]
    fn bounding_box_geometry() {
        let bbox = BoundingBox::from_coords(0.1, 0.2, 0.5, 0.6);
        assert!((bbox.width() - 0.4).abs() < 1e-12);
        assert!((bbox.area() - 0.16).abs() < 1e-12);
        assert_eq!(BoundingBox::from_coords(0.5, 0.5, 0.1, 0.1).area(), 0.0);
    }
}

//! End-to-end tests: declare sample schemas, then store and reload samples.

use dataset_fields::{
    ArrayCodec, ArrayField, BoundingBox, DetectedObject, DocumentRegistry, DocumentType,
    EmbeddedDocument, FieldDescriptor, FieldError, FieldsConfig, FloatField, ImageLabels,
    ImageLabelsField, ListField, NdArray, StringField, Value, VectorField, CLASS_KEY,
};
use ndarray::{array, ArrayD, IxDyn};

const SAMPLE_YAML: &str = r#"
name: Sample
fields:
  filepath:
    kind: string
    min_length: 1
  tags:
    kind: list
    field:
      kind: string
  ground_truth:
    kind: image-labels
  embedding:
    kind: vector
  mask:
    kind: array
  detections:
    kind: list
    field:
      kind: embedded-document
      document_type: Detection
"#;

const DETECTION_YAML: &str = r#"
name: Detection
fields:
  label:
    kind: string
  confidence:
    kind: float
    min_value: 0.0
    max_value: 1.0
"#;

fn registry() -> DocumentRegistry {
    let registry = DocumentRegistry::new();
    let config = FieldsConfig::default();
    // Sample refers to Detection before it is registered
    registry.register_yaml(SAMPLE_YAML, &config).unwrap();
    registry.register_yaml(DETECTION_YAML, &config).unwrap();
    registry
}

fn ground_truth() -> ImageLabels {
    let mut labels = ImageLabels::new();
    labels.add_object(
        DetectedObject::new("dog", BoundingBox::from_coords(0.1, 0.2, 0.4, 0.8))
            .with_confidence(0.9),
    );
    labels
}

fn sample() -> EmbeddedDocument {
    let mask: ArrayD<u8> = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![0, 1, 1, 0, 0, 1]).unwrap();
    EmbeddedDocument::new("Sample")
        .with("filepath", "/data/images/0001.jpg")
        .with(
            "tags",
            Value::List(vec![Value::from("train"), Value::from("validated")]),
        )
        .with("ground_truth", ground_truth())
        .with("embedding", NdArray::from(array![0.25, -1.5, 3.0]))
        .with("mask", NdArray::from(mask))
        .with(
            "detections",
            Value::List(vec![Value::Document(
                EmbeddedDocument::new("Detection")
                    .with("label", "dog")
                    .with("confidence", 0.9),
            )]),
        )
}

#[test_log::test]
fn sample_survives_storage_round_trip() {
    let registry = registry();
    let sample_type = registry.resolve("Sample").unwrap();

    let stored = sample_type.to_storage(&sample()).unwrap();
    assert_eq!(stored.get(CLASS_KEY), Some(&Value::from("Sample")));
    assert!(matches!(stored.get("mask"), Some(Value::Binary(_))));
    assert!(matches!(stored.get("ground_truth"), Some(Value::Dict(_))));
    assert_eq!(
        stored.get("embedding"),
        Some(&Value::List(vec![
            Value::Float(0.25),
            Value::Float(-1.5),
            Value::Float(3.0)
        ]))
    );
    assert!(stored.values().all(Value::is_storage));

    let loaded = sample_type.from_storage(stored).unwrap();
    assert_eq!(loaded, sample());
}

#[test]
fn stored_sample_is_plain_json() {
    let registry = registry();
    let sample_type = registry.resolve("Sample").unwrap();
    let mut sample = sample();
    sample.set("mask", Value::Null);

    let stored = sample_type.to_storage(&sample).unwrap();
    let json = serde_json::Value::try_from(Value::Dict(stored.clone())).unwrap();
    assert_eq!(json["_cls"], "Sample");
    assert_eq!(json["detections"][0]["_cls"], "Detection");

    let reloaded = sample_type
        .from_storage(match Value::from(json) {
            Value::Dict(dict) => dict,
            other => panic!("expected dict, got {other:?}"),
        })
        .unwrap();
    assert_eq!(reloaded.get("filepath"), sample.get("filepath"));
    assert_eq!(reloaded.get("ground_truth"), Some(&Value::from(ground_truth())));
}

#[test]
fn nested_validation_errors_name_the_path() {
    let registry = registry();
    let sample_type = registry.resolve("Sample").unwrap();
    let sample = sample().with(
        "detections",
        Value::List(vec![Value::Document(
            EmbeddedDocument::new("Detection").with("confidence", 1.5),
        )]),
    );

    match sample_type.validate(&sample).unwrap_err() {
        FieldError::ValidationFailed { field, message } => {
            assert_eq!(field, "detections.0.confidence");
            assert_eq!(message, "Float value is too large");
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn vector_reads_integers_back_as_floats() {
    let field = VectorField::new();
    let stored = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(
        field.from_storage(stored).unwrap(),
        Value::Array(NdArray::from(array![1.0, 2.0, 3.0]))
    );

    let matrix = NdArray::from(array![[1.0, 2.0], [3.0, 4.0]]);
    let err = field.validate(&Value::Array(matrix)).unwrap_err();
    assert_eq!(
        err.message(),
        Some("Only 1D arrays may be used in a vector field")
    );
}

#[test]
fn array_field_preserves_dtype_shape_and_values() {
    let field = ArrayField::with_codec(ArrayCodec::new(19));
    let original = NdArray::from(array![[[1.5f32, 2.5], [3.5, 4.5]], [[5.5, 6.5], [7.5, 8.5]]]);

    let stored = field.to_storage(&Value::Array(original.clone())).unwrap();
    let Value::Array(loaded) = field.from_storage(stored).unwrap() else {
        panic!("expected an array");
    };
    assert_eq!(loaded.shape(), &[2, 2, 2]);
    assert_eq!(loaded.dtype(), original.dtype());
    assert_eq!(loaded, original);
}

#[test]
fn image_labels_round_trip() {
    let field = ImageLabelsField::new();
    let value = Value::from(ground_truth());
    let stored = field.to_storage(&value).unwrap();
    assert_eq!(field.from_storage(stored).unwrap(), value);
}

#[test]
fn typed_schemas_match_yaml_schemas() {
    let registry = DocumentRegistry::new();
    registry
        .register(
            DocumentType::new("Detection")
                .field("label", StringField::new())
                .field(
                    "confidence",
                    FloatField::new().with_min(0.0).with_max(1.0),
                ),
        )
        .unwrap();
    let detections = ListField::new(Some(registry.embedded_field("Detection").into()));
    assert_eq!(
        detections.to_string(),
        "ListField(EmbeddedDocumentField(Detection))"
    );

    let stored = detections
        .to_storage(&Value::List(vec![Value::Document(
            EmbeddedDocument::new("Detection").with("label", "cat"),
        )]))
        .unwrap();
    let Value::List(items) = &stored else {
        panic!("expected list");
    };
    let Value::Dict(first) = &items[0] else {
        panic!("expected dict");
    };
    assert_eq!(first.keys().collect::<Vec<_>>(), vec![CLASS_KEY, "label"]);
}

#[test]
fn lenient_config_drops_unknown_stored_keys() {
    let registry = DocumentRegistry::new();
    let config = FieldsConfig {
        strict_documents: false,
        ..FieldsConfig::default()
    };
    let doc_type = registry.register_yaml(DETECTION_YAML, &config).unwrap();

    let mut stored = doc_type
        .to_storage(&EmbeddedDocument::new("Detection").with("label", "cat"))
        .unwrap();
    stored.insert("legacy".into(), Value::Int(1));

    let doc = doc_type.from_storage(stored).unwrap();
    assert!(doc.get("legacy").is_none());
    assert_eq!(doc.get("label"), Some(&Value::from("cat")));
}

use super::*;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use std::sync::Arc;
use tempfile::TempDir;

fn sample_image() -> DynamicImage {
    let img = ImageBuffer::from_fn(40, 20, |x, y| Rgb([(x * 6) as u8, (y * 12) as u8, 90u8]));
    DynamicImage::ImageRgb8(img)
}

fn resolver() -> FilterResolver {
    FilterResolver::new(Arc::new(FilterRegistry::builtin()))
}

#[test]
fn test_registry_names_are_sorted() {
    let names = FilterRegistry::builtin().names();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"sepia".to_string()));
}

#[test]
fn test_registry_accepts_class_style_names() {
    let registry = FilterRegistry::builtin();
    assert_eq!(registry.create("filters.Sepia").unwrap().name(), "sepia");
    assert_eq!(registry.create("  GRAYSCALE ").unwrap().name(), "grayscale");
    assert!(matches!(
        registry.create("filters.DoesNotExist"),
        Err(FilterError::UnknownFilter(_))
    ));
}

#[test]
fn test_resolve_without_selection_is_identity() {
    let filter = resolver().resolve(&FilterSelection::default());
    assert_eq!(filter.name(), "identity");

    let image = sample_image();
    let out = filter.apply(image.clone());
    assert_eq!(out.as_bytes(), image.as_bytes());
}

#[test]
fn test_resolve_named_filter() {
    let selection = FilterSelection {
        filter_class: Some("invert".to_string()),
        ..Default::default()
    };
    let filter = resolver().resolve(&selection);
    assert_eq!(filter.name(), "invert");

    let out = filter.apply(sample_image()).to_rgb8();
    assert_eq!(out.get_pixel(0, 0), &Rgb([255, 255, 165]));
}

#[test]
fn test_unknown_name_falls_through_to_description() {
    let selection = FilterSelection {
        filter_class: Some("no.such.Filter".to_string()),
        description_text: Some("[[steps]]\nop = \"grayscale\"\n".to_string()),
        ..Default::default()
    };
    let filter = resolver().resolve(&selection);
    assert_eq!(filter.name(), "grayscale");
}

#[test]
fn test_resolution_is_total() {
    let cases = vec![
        FilterSelection::default(),
        FilterSelection {
            filter_class: Some("bogus".to_string()),
            ..Default::default()
        },
        FilterSelection {
            description_text: Some("this is { not a filter".to_string()),
            ..Default::default()
        },
        FilterSelection {
            description_file: Some(vec![0xff, 0xfe, 0x00, 0x12]),
            ..Default::default()
        },
        FilterSelection {
            description_text: Some("[[steps]]\nop = \"blur\"\nsigma = -1.0\n".to_string()),
            ..Default::default()
        },
        FilterSelection {
            description_text: Some(String::new()),
            ..Default::default()
        },
    ];

    for selection in cases {
        let filter = resolver().resolve(&selection);
        assert_eq!(filter.name(), "identity", "selection {:?}", selection);
        // Must still be usable
        let out = filter.apply(sample_image());
        assert_eq!(out.dimensions(), (40, 20));
    }
}

#[test]
fn test_description_file_takes_precedence_over_text() {
    let selection = FilterSelection {
        filter_class: None,
        description_file: Some(br#"{"name": "from-file", "steps": [{"op": "invert"}]}"#.to_vec()),
        description_text: Some("[[steps]]\nop = \"sepia\"\n".to_string()),
    };
    assert_eq!(resolver().resolve(&selection).name(), "from-file");
}

#[test]
fn test_scratch_buffers_are_cleaned_up() {
    let scratch = TempDir::new().unwrap();
    let resolver = resolver().with_scratch_dir(scratch.path().to_path_buf());

    let ok = FilterSelection {
        description_text: Some(r#"[{"op": "rotate90"}]"#.to_string()),
        ..Default::default()
    };
    let bad = FilterSelection {
        description_text: Some("garbage".to_string()),
        ..Default::default()
    };

    assert_eq!(resolver.resolve(&ok).name(), "rotate90");
    assert_eq!(resolver.resolve(&bad).name(), "identity");
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn test_toml_description_pipeline() {
    let doc = r#"
name = "moody"

[[steps]]
op = "contrast"
amount = 20

[[steps]]
op = "rotate90"
"#;
    let filter = parse_description(doc.as_bytes()).unwrap();
    assert_eq!(filter.name(), "moody");
    assert_eq!(filter.apply(sample_image()).dimensions(), (20, 40));
}

#[test]
fn test_description_without_steps_is_rejected() {
    assert!(matches!(
        parse_description(b"name = \"empty\""),
        Err(FilterError::EmptyDescription)
    ));
}

#[test]
fn test_edges_produces_same_dimensions() {
    let filter = FilterRegistry::builtin().create("edges").unwrap();
    assert_eq!(filter.apply(sample_image()).dimensions(), (40, 20));
}

#[test]
fn test_out_of_range_sigma_is_rejected() {
    for doc in [
        br#"{"steps":[{"op":"blur","sigma":1e-40}]}"#.as_slice(),
        br#"{"steps":[{"op":"blur","sigma":1e9}]}"#.as_slice(),
        br#"{"steps":[{"op":"sharpen","sigma":0.0}]}"#.as_slice(),
        br#"{"steps":[{"op":"sharpen","sigma":250.0,"threshold":1}]}"#.as_slice(),
    ] {
        assert!(
            matches!(parse_description(doc), Err(FilterError::InvalidParameter { .. })),
            "accepted {}",
            String::from_utf8_lossy(doc)
        );
    }

    assert!(parse_description(br#"{"steps":[{"op":"blur","sigma":100.0}]}"#).is_ok());
}

#[test]
fn test_out_of_range_edge_thresholds_are_rejected() {
    for doc in [
        br#"[{"op":"edges","low":-1.0,"high":10.0}]"#.as_slice(),
        br#"[{"op":"edges","low":20.0,"high":10.0}]"#.as_slice(),
        br#"[{"op":"edges","low":10.0,"high":1e12}]"#.as_slice(),
    ] {
        assert!(matches!(
            parse_description(doc),
            Err(FilterError::InvalidParameter { .. })
        ));
    }
}

#[test]
fn test_unusable_sigma_degrades_to_identity() {
    let resolver = resolver();
    for text in [
        r#"{"steps":[{"op":"blur","sigma":1e-40}]}"#,
        r#"{"steps":[{"op":"blur","sigma":1e9}]}"#,
    ] {
        let selection = FilterSelection {
            description_text: Some(text.to_string()),
            ..Default::default()
        };
        let filter = resolver.resolve(&selection);
        assert_eq!(filter.name(), "identity");

        let image = sample_image();
        let out = filter.apply(image.clone());
        assert_eq!(out.as_bytes(), image.as_bytes());
    }
}

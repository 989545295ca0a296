//! Classification tests for fos-dropzone
//!
//! Accept matching, size bounds and batch classification as a caller sees
//! them through the public API.

use fos_dropzone::accept;
use fos_dropzone::size;
use fos_dropzone::*;

fn file(name: &str, size: u64, mime: &str) -> FileEntry {
    FileEntry::new(name, size, mime)
}

fn jpeg_only() -> AcceptSpec {
    AcceptSpec::new().with("image/jpeg", &[])
}

// ============================================================================
// ACCEPT MATCHING
// ============================================================================

#[test]
fn test_jpeg_spec_matches_only_jpeg_and_placeholder() {
    let spec = jpeg_only();
    let cases = [
        ("image/jpeg", true),
        ("IMAGE/JPEG", true),
        ("Image/Jpeg", true),
        (MOZ_FILE_MIME, true),
        ("image/gif", false),
        ("image/png", false),
        ("image/jpegx", false),
        ("", false),
        ("text/plain", false),
    ];
    for (mime, expected) in cases {
        let f = file("photo", 10, mime);
        assert_eq!(accept::matches(&f, Some(&spec)), expected, "type {mime:?}");
    }
}

#[test]
fn test_accept_attr_is_flattened_tokens() {
    assert_eq!(jpeg_only().to_accept_attr(), "image/jpeg");
    assert_eq!(
        AcceptSpec::new().with("image/png", &[".png"]).to_accept_attr(),
        "image/png,.png"
    );
}

#[test]
fn test_accept_from_json_keeps_key_order() {
    let spec: AcceptSpec =
        serde_json::from_str(r#"{"text/plain": [".txt"], "image/*": [".png", ".gif"]}"#).unwrap();
    assert_eq!(spec.to_accept_attr(), "text/plain,.txt,image/*,.png,.gif");
}

// ============================================================================
// SIZE BOUNDS
// ============================================================================

#[test]
fn test_sizes_within_bounds_pass() {
    let bounds = [(0, 0), (0, 10), (5, 5), (500, 1500), (1, u64::MAX)];
    for (min, max) in bounds {
        for size in [min, max, min + (max - min) / 2] {
            let f = file("f", size, "text/plain");
            assert_eq!(size::check(&f, min, Some(max)), None, "{min} <= {size} <= {max}");
        }
    }
}

#[test]
fn test_unknown_size_passes() {
    let f = FileEntry::without_size("f", "text/plain");
    assert_eq!(size::check(&f, 500, Some(1500)), None);
}

#[test]
fn test_too_small_scenario() {
    let policy = Policy {
        min_size: 500,
        max_size: Some(1500),
        ..Policy::default()
    };
    let result = classify(&[file("small.txt", 400, "text/plain")], &policy);

    assert!(result.accepted.is_empty());
    assert_eq!(result.rejected.len(), 1);
    assert_eq!(
        result.rejected[0].errors,
        vec![FileError::new(ErrorCode::FileTooSmall, "File is smaller than 500 bytes")]
    );
}

// ============================================================================
// BATCH CLASSIFICATION
// ============================================================================

#[test]
fn test_invalid_type_scenario() {
    let policy = Policy {
        accept: Some(jpeg_only()),
        ..Policy::default()
    };
    let result = classify(&[file("cats.gif", 1234, "image/gif")], &policy);

    assert!(result.accepted.is_empty());
    assert_eq!(result.rejected.len(), 1);
    assert_eq!(result.rejected[0].file.name, "cats.gif");
    assert_eq!(
        result.rejected[0].errors,
        vec![FileError::new(ErrorCode::FileInvalidType, "File type must be image/jpeg")]
    );
}

#[test]
fn test_single_file_mode_rejects_pairs() {
    let policy = Policy {
        multiple: false,
        ..Policy::default()
    };
    let files = [file("a.txt", 1, "text/plain"), file("b.txt", 1, "text/plain")];
    let result = classify(&files, &policy);

    assert!(result.accepted.is_empty());
    assert_eq!(result.rejected.len(), 2);
    for rejection in &result.rejected {
        assert_eq!(rejection.errors.len(), 1);
        assert_eq!(rejection.errors[0].code, ErrorCode::TooManyFiles);
    }
}

#[test]
fn test_max_files_is_all_or_nothing() {
    let policy = Policy {
        max_files: 2,
        ..Policy::default()
    };
    let files = [
        file("a.txt", 1, "text/plain"),
        file("b.txt", 1, "text/plain"),
        file("c.txt", 1, "text/plain"),
    ];
    let result = classify(&files, &policy);

    assert!(result.accepted.is_empty());
    let names: Vec<_> = result.rejected.iter().map(|r| r.file.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    assert!(result
        .rejected
        .iter()
        .all(|r| r.errors == vec![FileError::too_many_files()]));

    let result = classify(&files[..2], &policy);
    assert_eq!(result.accepted.len(), 2);
}

#[test]
fn test_rejections_keep_input_order_in_mixed_batch() {
    let policy = Policy {
        accept: Some(jpeg_only()),
        max_size: Some(5000),
        max_files: 1,
        ..Policy::default()
    };
    let files = [
        file("a.jpg", 100, "image/jpeg"),
        file("huge.jpg", 9000, "image/jpeg"),
        file("c.gif", 100, "image/gif"),
        file("b.jpg", 100, "image/jpeg"),
    ];
    let result = classify(&files, &policy);

    assert!(result.accepted.is_empty());
    let rejected: Vec<_> = result
        .rejected
        .iter()
        .map(|r| (r.file.name.as_str(), r.errors[0].code.clone(), r.errors.len()))
        .collect();
    assert_eq!(
        rejected,
        vec![
            ("a.jpg", ErrorCode::TooManyFiles, 1),
            ("huge.jpg", ErrorCode::FileTooLarge, 1),
            ("c.gif", ErrorCode::FileInvalidType, 1),
            ("b.jpg", ErrorCode::TooManyFiles, 1),
        ]
    );
}

#[test]
fn test_custom_validator_codes() {
    let policy = Policy {
        validator: Some(validator(|f: &FileEntry| {
            (f.name.len() > 8).then(|| FileError::new("name-too-large", "Name is larger than 8 characters"))
        })),
        ..Policy::default()
    };
    let result = classify(
        &[file("short.md", 1, "text/markdown"), file("much-longer.md", 1, "text/markdown")],
        &policy,
    );

    assert_eq!(result.accepted.len(), 1);
    assert_eq!(
        result.rejected[0].errors[0].code,
        ErrorCode::Custom("name-too-large".into())
    );
}

#[test]
fn test_classification_is_idempotent() {
    let policy = Policy {
        accept: Some(AcceptSpec::new().with("image/*", &[]).with("text/plain", &[".txt"])),
        min_size: 2,
        max_size: Some(100),
        max_files: 3,
        ..Policy::default()
    };
    let files = [
        file("a.png", 50, "image/png"),
        file("b.exe", 50, "application/octet-stream"),
        file("c.txt", 500, "text/plain"),
        file("d.txt", 1, "text/plain"),
        file("e.gif", 10, "image/gif"),
    ];

    let first = classify(&files, &policy);
    let second = classify(&files, &policy);
    assert_eq!(first, second);
    assert_eq!(first.accepted.len(), 2);
    assert_eq!(first.rejected.len(), 3);
}

#[test]
fn test_rejection_errors_serialize_as_codes() {
    let json = serde_json::to_value(FileError::too_many_files()).unwrap();
    assert_eq!(json["code"], "too-many-files");
    assert_eq!(json["message"], "Too many files");
}

//! File size bounds

use fos_dom::FileEntry;

use crate::FileError;

/// Check `file` against inclusive size bounds.
///
/// Entries without a size pass. At most one error is reported: an
/// oversized file is never also reported as undersized.
pub fn check(file: &FileEntry, min_size: u64, max_size: Option<u64>) -> Option<FileError> {
    let size = file.size?;
    match max_size {
        Some(max) if size > max => Some(FileError::too_large(max)),
        _ if size < min_size => Some(FileError::too_small(min_size)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    fn sized(size: u64) -> FileEntry {
        FileEntry::new("f.bin", size, "application/octet-stream")
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(check(&sized(500), 500, Some(1500)), None);
        assert_eq!(check(&sized(1500), 500, Some(1500)), None);
        assert_eq!(check(&sized(1000), 500, Some(1500)), None);
    }

    #[test]
    fn test_too_small() {
        let err = check(&sized(400), 500, Some(1500)).unwrap();
        assert_eq!(err.code, ErrorCode::FileTooSmall);
        assert_eq!(err.message, "File is smaller than 500 bytes");
    }

    #[test]
    fn test_too_large() {
        let err = check(&sized(1501), 500, Some(1500)).unwrap();
        assert_eq!(err.code, ErrorCode::FileTooLarge);
        assert_eq!(err.message, "File is larger than 1500 bytes");
    }

    #[test]
    fn test_unbounded_max() {
        assert_eq!(check(&sized(u64::MAX), 0, None), None);
    }

    #[test]
    fn test_inverted_bounds_prefer_too_large() {
        let err = check(&sized(50), 100, Some(10)).unwrap();
        assert_eq!(err.code, ErrorCode::FileTooLarge);
    }

    #[test]
    fn test_missing_size_passes() {
        let entry = FileEntry::without_size("dir", "");
        assert_eq!(check(&entry, 10, Some(20)), None);
    }

    #[test]
    fn test_every_size_within_bounds_passes() {
        for (min, max) in [(0, 0), (0, 10), (5, 5), (3, 9)] {
            for size in min..=max {
                assert_eq!(check(&sized(size), min, Some(max)), None, "{min}..={max} @ {size}");
            }
        }
    }
}

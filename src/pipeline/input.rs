//! Input validation: make sure a path is a readable PDF before pdfium sees it.
//!
//! pdfium's own errors for a missing or non-PDF file are vague, so we check
//! existence, read permission and the `%PDF` header ourselves and report a
//! precise [`ConvertError`].

use crate::error::ConvertError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// How far into the file the `%PDF` marker may appear. Some producers put
/// junk (e.g. a MacBinary header) before it and pdfium accepts that.
const HEADER_WINDOW: usize = 1024;

/// Check that `path` exists, is readable and starts like a PDF.
pub fn check_pdf(path: &Path) -> Result<(), ConvertError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    };
    if !meta.is_file() {
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic: Vec::new(),
        });
    }

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    };

    let mut head = Vec::with_capacity(HEADER_WINDOW);
    file.by_ref()
        .take(HEADER_WINDOW as u64)
        .read_to_end(&mut head)
        .map_err(|e| ConvertError::CorruptPdf {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    if !head.windows(4).any(|w| w == b"%PDF") {
        head.truncate(4);
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic: head,
        });
    }

    debug!("Validated PDF header: {}", path.display());
    Ok(())
}

/// `true` when the path has a `.pdf` extension (any case).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = check_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"GIF89a....").unwrap();
        match check_pdf(&path).unwrap_err() {
            ConvertError::NotAPdf { magic, .. } => assert_eq!(magic, b"GIF8".to_vec()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            check_pdf(&path).unwrap_err(),
            ConvertError::NotAPdf { .. }
        ));
    }

    #[test]
    fn header_after_junk_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.pdf");
        std::fs::write(&path, b"\x00\x00junk%PDF-1.4\n").unwrap();
        check_pdf(&path).expect("header inside the window");
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            check_pdf(dir.path()).unwrap_err(),
            ConvertError::NotAPdf { .. }
        ));
    }

    #[test]
    fn pdf_extension_any_case() {
        assert!(has_pdf_extension(Path::new("a/b.PDF")));
        assert!(has_pdf_extension(Path::new("b.pdf")));
        assert!(!has_pdf_extension(Path::new("b.pdf.part")));
        assert!(!has_pdf_extension(Path::new("README")));
    }
}

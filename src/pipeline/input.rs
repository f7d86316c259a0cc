//! Input validation: make sure a user-supplied path is a readable PDF.
//!
//! Checks run cheapest first: existence, `.pdf` extension, size limit, then
//! the `%PDF` magic bytes. Rejecting bad inputs here gives the user a
//! meaningful message instead of a pdfium load failure.

use crate::error::AnalyzerError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether the path carries a `.pdf` extension (any case).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Validate `path` as an analysable PDF no larger than `max_bytes`.
pub fn validate_pdf(path: &Path, max_bytes: u64) -> Result<PathBuf, AnalyzerError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(AnalyzerError::FileNotFound { path });
    }
    if !has_pdf_extension(&path) {
        return Err(AnalyzerError::NotPdfExtension { path });
    }

    let mut file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(AnalyzerError::PermissionDenied { path });
        }
        Err(_) => return Err(AnalyzerError::FileNotFound { path }),
    };

    let size = file
        .metadata()
        .map_err(|e| AnalyzerError::Internal(format!("stat {}: {e}", path.display())))?
        .len();
    if size > max_bytes {
        return Err(AnalyzerError::FileTooLarge {
            path,
            size_mb: size as f64 / (1024.0 * 1024.0),
            limit_mb: max_bytes / (1024 * 1024),
        });
    }

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => {}
        Ok(()) => return Err(AnalyzerError::NotAPdf { path, magic }),
        Err(_) => {
            // Fewer than four bytes: report whatever was there.
            return Err(AnalyzerError::NotAPdf { path, magic });
        }
    }

    debug!("Validated PDF: {} ({} bytes)", path.display(), size);
    Ok(path)
}

//! File intake checks applied before a file reaches the parser

use std::path::Path;

use tracing::debug;

use crate::error::ImportError;

/// Default upload size limit (10 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types the loader accepts, one per extension the parser reads
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel.sheet.macroenabled.12",
    "application/vnd.ms-excel.sheet.binary.macroenabled.12",
    "application/vnd.oasis.opendocument.spreadsheet",
];

/// Size and type gate for selected files
#[derive(Debug, Clone)]
pub struct FileIntake {
    max_bytes: u64,
}

impl Default for FileIntake {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl FileIntake {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Check type and size of `path`. Returns the file size on success.
    pub fn check(&self, path: &Path) -> Result<u64, ImportError> {
        self.check_type(path)?;

        let size = std::fs::metadata(path)
            .map_err(|e| ImportError::FileRejected(format!("{}: {}", path.display(), e)))?
            .len();
        self.check_size(size)?;

        debug!("Accepted {} ({} bytes)", path.display(), size);
        Ok(size)
    }

    pub fn check_type(&self, path: &Path) -> Result<(), ImportError> {
        let guess = mime_guess::from_path(path);
        let accepted = guess.iter().any(|m| {
            ACCEPTED_MIME_TYPES
                .iter()
                .any(|t| t.eq_ignore_ascii_case(m.essence_str()))
        });
        if accepted {
            return Ok(());
        }

        let found = guess
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Err(ImportError::FileRejected(format!(
            "file type {} is not accepted (CSV or spreadsheet only)",
            found
        )))
    }

    pub fn check_size(&self, size: u64) -> Result<(), ImportError> {
        if size > self.max_bytes {
            return Err(ImportError::FileRejected(format!(
                "file is {} bytes, the limit is {} bytes",
                size, self.max_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parser::FileFormat;
    use std::io::Write;

    #[test]
    fn test_accepts_csv_and_excel_types() {
        let intake = FileIntake::default();
        assert!(intake.check_type(Path::new("ventas.csv")).is_ok());
        assert!(intake.check_type(Path::new("ventas.xlsx")).is_ok());
        assert!(intake.check_type(Path::new("ventas.XLS")).is_ok());
    }

    #[test]
    fn test_every_parseable_extension_passes_intake() {
        let intake = FileIntake::default();
        for name in ["a.csv", "a.xlsx", "a.xlsm", "a.xlsb", "a.xls", "a.ods"] {
            let path = Path::new(name);
            assert!(FileFormat::from_path(path).is_ok(), "{} should parse", name);
            assert!(intake.check_type(path).is_ok(), "{} should pass intake", name);
        }
    }

    #[test]
    fn test_rejects_other_types() {
        let intake = FileIntake::default();
        let err = intake.check_type(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, ImportError::FileRejected(_)));
        assert!(intake.check_type(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_size_limit() {
        let intake = FileIntake::new(100);
        assert!(intake.check_size(100).is_ok());
        assert!(intake.check_size(101).is_err());
        assert!(FileIntake::default().check_size(10_485_760).is_ok());
        assert!(FileIntake::default().check_size(10_485_761).is_err());
    }

    #[test]
    fn test_check_reads_size_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "nombre,email\nAna,ana@x.com\n").unwrap();

        let size = FileIntake::new(1024).check(file.path()).unwrap();
        assert_eq!(size, 27);

        let err = FileIntake::new(10).check(file.path()).unwrap_err();
        assert!(err.to_string().contains("limit is 10 bytes"));
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use thiserror::Error;

pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum FileRejection {
    #[error("Please choose an .xlsx Excel file ({name} is not one)")]
    WrongExtension { name: String },
    #[error("File size must not exceed 2MB ({name} is {size} bytes)")]
    TooLarge { name: String, size: u64 },
    #[error("Could not read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The single file staged for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub modified: Option<DateTime<Local>>,
}

impl SelectedFile {
    /// Reads file metadata and applies the pre-flight checks. Nothing here
    /// touches the network.
    pub fn inspect(path: &Path) -> Result<Self, FileRejection> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        check_extension(&name)?;

        let metadata = fs::metadata(path).map_err(|source| FileRejection::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        check_size(&name, metadata.len())?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            mime: String::from(XLSX_MIME),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        })
    }

    pub fn modified_label(&self) -> String {
        self.modified
            .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| String::from("-"))
    }
}

pub fn check_extension(name: &str) -> Result<(), FileRejection> {
    if name.to_lowercase().ends_with(".xlsx") {
        Ok(())
    } else {
        Err(FileRejection::WrongExtension {
            name: name.to_string(),
        })
    }
}

pub fn check_size(name: &str, size: u64) -> Result<(), FileRejection> {
    if size > MAX_UPLOAD_BYTES {
        Err(FileRejection::TooLarge {
            name: name.to_string(),
            size,
        })
    } else {
        Ok(())
    }
}

/// Human-readable size with at most two decimals, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return String::from("0 Bytes");
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

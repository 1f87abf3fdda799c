use crate::errors::SchemaError;
use crate::models::{Document, FragmentFile};
use crate::schema::SchemaRegistry;
use crate::serialize::{ParseReport, parse_document, render_document};
use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

pub const FRAGMENT_EXTENSION: &str = "html";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid content directory: {0}")]
    InvalidContentDir(String),
    #[error("Path is not inside the content directory: {0}")]
    OutsideContentDir(PathBuf),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Read a stored fragment and return its HTML
pub fn read_fragment(relative_path: &RelativePath, content_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(content_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write HTML to a fragment file, creating parent directories as needed
pub fn write_fragment(
    relative_path: &RelativePath,
    content_root: &Path,
    html: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(content_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, html).map_err(IoError::Io)
}

/// Load and parse a fragment
pub fn load_document(
    registry: &SchemaRegistry,
    relative_path: &RelativePath,
    content_root: &Path,
) -> Result<(Document, ParseReport), IoError> {
    let html = read_fragment(relative_path, content_root)?;
    let (document, report) = parse_document(registry, &html);
    if !report.is_clean() {
        log::debug!(
            "{relative_path}: {} problems repaired on load",
            report.len()
        );
    }
    Ok((document, report))
}

/// Serialize a document into a fragment file
pub fn save_document(
    registry: &SchemaRegistry,
    document: &Document,
    relative_path: &RelativePath,
    content_root: &Path,
) -> Result<(), IoError> {
    let html = render_document(registry, document)?;
    write_fragment(relative_path, content_root, &html)
}

/// Scan for fragment files in the content directory
pub fn scan_fragments(content_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    validate_content_dir(content_root)?;

    let mut files = Vec::new();
    scan_directory_recursive(content_root, &mut files)?;
    files.sort();
    Ok(files)
}

/// All fragments under the content directory, addressed relative to it
pub fn list_fragments(content_root: &Path) -> Result<Vec<FragmentFile>, IoError> {
    scan_fragments(content_root)?
        .into_iter()
        .map(|path| {
            let relative = path
                .strip_prefix(content_root)
                .ok()
                .and_then(|p| RelativePathBuf::from_path(p).ok())
                .ok_or_else(|| IoError::OutsideContentDir(path.clone()))?;
            Ok(FragmentFile::new(relative))
        })
        .collect()
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == FRAGMENT_EXTENSION
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_content_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidContentDir(format!(
            "{} does not exist or is not a directory",
            path.display()
        )));
    }

    Ok(())
}

//! Reads uploaded files and extracts their plain text.

use docx_rs::{read_docx, DocumentChild};
use domain::models::{DocumentFormat, SourceText};
use domain::{LabError, LabResult};
use memmap2::Mmap;
use rayon::prelude::*;
use shared::utils::is_supported_file;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file to load, and whether the user named it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub explicit: bool,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub sources: Vec<SourceText>,
    /// Files found while walking a directory that could not be loaded.
    pub skipped: Vec<(PathBuf, LabError)>,
}

pub struct DocumentLoader {
    ignored_dirs: HashSet<String>,
    max_file_bytes: u64,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            ignored_dirs: [".git", "target", "node_modules", ".cache", "venv", "__pycache__"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_bytes: 64 * 1024 * 1024,
        }
    }

    /// Expand directories into the supported files below them. Explicit file
    /// arguments are kept as given so unsupported ones fail loudly on load.
    pub fn collect_paths(&self, inputs: &[PathBuf]) -> LabResult<Vec<DiscoveredFile>> {
        let mut files = Vec::new();
        for input in inputs {
            if input.is_dir() {
                let mut found = Vec::new();
                self.collect_files_recursive(input, &mut found)?;
                found.sort();
                files.extend(found.into_iter().map(|path| DiscoveredFile {
                    path,
                    explicit: false,
                }));
            } else {
                files.push(DiscoveredFile {
                    path: input.clone(),
                    explicit: true,
                });
            }
        }
        Ok(files)
    }

    /// Load every file in parallel; sources keep the input order.
    ///
    /// A failing explicit file fails the whole call. A failing file found in
    /// a directory is logged and reported in [`LoadOutcome::skipped`].
    pub fn load_paths(&self, files: &[DiscoveredFile]) -> LabResult<LoadOutcome> {
        info!(count = files.len(), "loading documents");
        let results: Vec<_> = files.par_iter().map(|file| self.load(&file.path)).collect();

        let mut outcome = LoadOutcome::default();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(source) => outcome.sources.push(source),
                Err(err) if file.explicit => return Err(err),
                Err(err) => {
                    warn!(path = %file.path.display(), error = %err, "skipping document");
                    outcome.skipped.push((file.path.clone(), err));
                }
            }
        }
        Ok(outcome)
    }

    pub fn load(&self, path: &Path) -> LabResult<SourceText> {
        let format = detect_format(path)?;
        let meta = path.metadata().map_err(|e| io_error(path, e))?;
        if meta.len() == 0 {
            return Err(LabError::InvalidInput(format!("{} is empty", path.display())));
        }
        if meta.len() > self.max_file_bytes {
            return Err(LabError::InvalidInput(format!(
                "{} is larger than {} bytes",
                path.display(),
                self.max_file_bytes
            )));
        }

        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let mmap = unsafe { Mmap::map(&file).map_err(|e| io_error(path, e))? };
        let text = extract_text(&mmap, format)
            .map_err(|e| LabError::Io(format!("{}: {e}", path.display())))?;
        if text.trim().is_empty() {
            return Err(LabError::InvalidInput(format!(
                "no text could be extracted from {}",
                path.display()
            )));
        }

        debug!(path = %path.display(), format = format.as_str(), chars = text.chars().count(), "document loaded");
        Ok(SourceText {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            format,
            text,
        })
    }

    fn collect_files_recursive(&self, dir: &Path, files: &mut Vec<PathBuf>) -> LabResult<()> {
        for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
            let path = entry.map_err(|e| io_error(dir, e))?.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if self.ignored_dirs.contains(name) {
                        continue;
                    }
                }
                self.collect_files_recursive(&path, files)?;
            } else if is_supported_file(&path) {
                files.push(path);
            }
        }
        Ok(())
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn detect_format(path: &Path) -> LabResult<DocumentFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::from_extension)
        .ok_or_else(|| {
            LabError::InvalidInput(format!(
                "{}: unsupported format (expected txt, md, pdf or docx)",
                path.display()
            ))
        })
}

/// Plain text of `bytes` interpreted as `format`.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, String> {
    match format {
        // Lossy conversion ensures non-UTF8 bytes don't abort ingestion.
        DocumentFormat::PlainText => Ok(String::from_utf8_lossy(bytes).into_owned()),
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string()),
        DocumentFormat::Docx => {
            let docx = read_docx(bytes).map_err(|e| e.to_string())?;
            let mut text = String::new();
            for child in &docx.document.children {
                match child {
                    DocumentChild::Paragraph(p) => {
                        text.push_str(&p.raw_text());
                        text.push('\n');
                    }
                    DocumentChild::Table(_) => {
                        debug!("skipping docx table");
                    }
                    _ => {}
                }
            }
            Ok(text)
        }
    }
}

fn io_error(path: &Path, err: std::io::Error) -> LabError {
    LabError::Io(format!("{}: {err}", path.display()))
}

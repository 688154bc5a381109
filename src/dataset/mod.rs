//! Dataset enumeration and output directory setup
//!
//! The input tree has one subdirectory per class label:
//!
//! ```text
//! Dataset/
//!   cats/  a.jpg b.png
//!   dogs/  c.jpg
//! ```
//!
//! Each mode writes to its own output directory mirroring the class
//! subdirectories, so `Dataset/cats/a.jpg` becomes
//! `<root>/output_parallel/cats/a.jpg` in pooled mode.

use crate::config::{Mode, OutputLayout};
use crate::error::BenchError;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions recognised as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// One image of the dataset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageRecord {
    /// Path of the source image
    pub source: PathBuf,
    /// Name of the class directory containing the image
    pub class_label: String,
    /// File name, preserved in the output
    pub file_name: String,
}

impl ImageRecord {
    /// Output path of this record under a mode's output directory
    pub fn output_path(&self, mode_dir: &Path) -> PathBuf {
        mode_dir.join(&self.class_label).join(&self.file_name)
    }

    /// Output path of this record for `mode`
    pub fn output_for(&self, layout: &OutputLayout, mode: Mode) -> PathBuf {
        self.output_path(&layout.mode_dir(mode))
    }
}

/// Whether `path` has one of the recognised image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Enumerate all images under `input_dir`
///
/// Records are sorted by class label, then file name, so every run sees the
/// same order. Files directly under `input_dir` are ignored; only class
/// subdirectories are scanned.
///
/// # Errors
///
/// `BenchError::Setup` if the directory is missing, unreadable, or holds no
/// images.
pub fn scan_dataset(input_dir: &Path) -> Result<Vec<ImageRecord>, BenchError> {
    if !input_dir.exists() {
        return Err(BenchError::Setup(format!(
            "input directory '{}' not found",
            input_dir.display()
        )));
    }
    if !input_dir.is_dir() {
        return Err(BenchError::Setup(format!(
            "input path '{}' is not a directory",
            input_dir.display()
        )));
    }

    let mut records = Vec::new();
    for class_dir in read_dir_sorted(input_dir)? {
        if !class_dir.is_dir() {
            continue;
        }
        let Some(class_label) = file_name_string(&class_dir) else {
            log::warn!("Skipping class directory with non UTF-8 name: {}", class_dir.display());
            continue;
        };

        let before = records.len();
        for path in read_dir_sorted(&class_dir)? {
            if !path.is_file() || !is_image_file(&path) {
                continue;
            }
            let Some(file_name) = file_name_string(&path) else {
                log::warn!("Skipping file with non UTF-8 name: {}", path.display());
                continue;
            };
            records.push(ImageRecord {
                source: path,
                class_label: class_label.clone(),
                file_name,
            });
        }
        log::debug!("Class '{}': {} image(s)", class_label, records.len() - before);
    }

    if records.is_empty() {
        return Err(BenchError::Setup(format!(
            "input directory '{}' contains no images",
            input_dir.display()
        )));
    }

    Ok(records)
}

/// Distinct class labels, sorted
pub fn class_labels(records: &[ImageRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.class_label.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Create the mode directory and one subdirectory per class label
pub fn prepare_output_dirs(records: &[ImageRecord], mode_dir: &Path) -> Result<(), BenchError> {
    for label in class_labels(records) {
        let dir = mode_dir.join(&label);
        fs::create_dir_all(&dir).map_err(|e| {
            BenchError::Setup(format!("cannot create output directory '{}': {}", dir.display(), e))
        })?;
    }
    // Mode directory itself, even for an empty record list
    fs::create_dir_all(mode_dir).map_err(|e| {
        BenchError::Setup(format!("cannot create output directory '{}': {}", mode_dir.display(), e))
    })?;
    Ok(())
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, BenchError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        BenchError::Setup(format!("cannot read directory '{}': {}", dir.display(), e))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            BenchError::Setup(format!("cannot read directory '{}': {}", dir.display(), e))
        })?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn file_name_string(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_string)
}

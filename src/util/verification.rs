//! Output verification
//!
//! After a run, every record should have an output file of exactly the
//! target size. `verify_outputs` re-reads the image headers in parallel with
//! rayon and reports the ones that do not match. Records the run reported as
//! failed are failures regardless of what is on disk.

use crate::config::Mode;
use crate::config::OutputLayout;
use crate::dataset::ImageRecord;
use crate::error::ItemError;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Why an output failed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The run failed to produce this output
    NotProduced { path: PathBuf, reason: String },
    /// Output missing or not decodable
    Unreadable { path: PathBuf, reason: String },
    /// Output decoded with the wrong dimensions
    WrongSize {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl std::fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotProduced { path, reason } => {
                write!(f, "{}: not produced ({})", path.display(), reason)
            }
            Self::Unreadable { path, reason } => write!(f, "{}: {}", path.display(), reason),
            Self::WrongSize { path, expected, actual } => write!(
                f,
                "{}: expected {}x{}, found {}x{}",
                path.display(),
                expected.0,
                expected.1,
                actual.0,
                actual.1
            ),
        }
    }
}

/// Summary of a verification pass
#[derive(Debug, Default)]
pub struct VerificationReport {
    pub checked: usize,
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check the outputs of `records` for `mode` against `expected` dimensions
///
/// `failed` holds the item errors of the run, keyed by the source or output
/// path they name; their records are reported as `NotProduced` without
/// looking at the output file.
pub fn verify_outputs(
    records: &[ImageRecord],
    layout: &OutputLayout,
    mode: Mode,
    expected: (u32, u32),
    failed: &[ItemError],
) -> VerificationReport {
    let checked = AtomicUsize::new(0);
    let total = records.len();
    let failed: HashMap<&Path, &ItemError> = failed.iter().map(|e| (e.path.as_path(), e)).collect();

    let mut failures: Vec<_> = records
        .par_iter()
        .filter_map(|record| {
            let path = record.output_for(layout, mode);
            let error = failed
                .get(record.source.as_path())
                .or_else(|| failed.get(path.as_path()));
            let result = match error {
                Some(error) => Some(VerificationFailure::NotProduced {
                    path,
                    reason: error.to_string(),
                }),
                None => check_dimensions(path, expected),
            };

            let done = checked.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 1000 == 0 || done == total {
                log::debug!("Verified {}/{} outputs", done, total);
            }
            result
        })
        .collect();

    // par_iter collect keeps input order, sort anyway for stable reports
    failures.sort_by(|a, b| failure_path(a).cmp(failure_path(b)));

    VerificationReport {
        checked: checked.into_inner(),
        failures,
    }
}

fn check_dimensions(path: PathBuf, expected: (u32, u32)) -> Option<VerificationFailure> {
    match image::image_dimensions(&path) {
        Ok(actual) if actual == expected => None,
        Ok(actual) => Some(VerificationFailure::WrongSize {
            path,
            expected,
            actual,
        }),
        Err(e) => Some(VerificationFailure::Unreadable {
            path,
            reason: e.to_string(),
        }),
    }
}

fn failure_path(failure: &VerificationFailure) -> &PathBuf {
    match failure {
        VerificationFailure::NotProduced { path, .. }
        | VerificationFailure::Unreadable { path, .. }
        | VerificationFailure::WrongSize { path, .. } => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ItemStage;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn record(root: &std::path::Path, class: &str, name: &str) -> ImageRecord {
        ImageRecord {
            source: root.join("in").join(class).join(name),
            class_label: class.to_string(),
            file_name: name.into(),
        }
    }

    fn write_output(layout: &OutputLayout, record: &ImageRecord, w: u32, h: u32) {
        let path = record.output_for(layout, Mode::Pooled);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(w, h, Rgb([10, 20, 30])).save(path).unwrap();
    }

    #[test]
    fn test_all_outputs_match() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        let records: Vec<_> = (0..5).map(|i| record(dir.path(), "cats", &format!("{}.png", i))).collect();
        for r in &records {
            write_output(&layout, r, 16, 16);
        }

        let report = verify_outputs(&records, &layout, Mode::Pooled, (16, 16), &[]);
        assert_eq!(report.checked, 5);
        assert!(report.passed());
    }

    #[test]
    fn test_wrong_size_and_missing() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        let good = record(dir.path(), "a", "good.png");
        let small = record(dir.path(), "a", "small.png");
        let missing = record(dir.path(), "b", "missing.png");
        write_output(&layout, &good, 16, 16);
        write_output(&layout, &small, 8, 16);

        let report = verify_outputs(&[good, small, missing], &layout, Mode::Pooled, (16, 16), &[]);
        assert_eq!(report.checked, 3);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            report.failures[0],
            VerificationFailure::WrongSize { actual: (8, 16), .. }
        ));
        assert!(matches!(report.failures[1], VerificationFailure::Unreadable { .. }));
    }

    #[test]
    fn test_failed_record_fails_despite_existing_output() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        let kept = record(dir.path(), "a", "kept.png");
        let stale = record(dir.path(), "a", "stale.png");
        let unwritable = record(dir.path(), "a", "unwritable.png");
        for r in [&kept, &stale, &unwritable] {
            write_output(&layout, r, 16, 16);
        }

        let failed = vec![
            ItemError::new(&stale.source, ItemStage::Load, "corrupt"),
            ItemError::new(unwritable.output_for(&layout, Mode::Pooled), ItemStage::Write, "disk full"),
        ];
        let report = verify_outputs(&[kept, stale, unwritable], &layout, Mode::Pooled, (16, 16), &failed);

        assert_eq!(report.checked, 3);
        assert!(!report.passed());
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f, VerificationFailure::NotProduced { .. })));
        assert!(report.failures[0].to_string().contains("corrupt"));
    }
}

//! # Batch Runner
//!
//! Runs the extractor over every font of every family on a bounded rayon
//! pool. Results come back in a grid shaped like the input: slot `(i, j)`
//! holds font `j` of family `i`, whatever order the workers finish in.
//!
//! A failing font (unreadable, too large, unparseable) fills its own slot
//! with a [`FontError`] and is logged; siblings are unaffected.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{CatalogError, FontError};
use crate::metadata::FontFamilyRecord;
use crate::sfnt::{extract_metrics_with, FontMetrics, ParseOptions};

/// Default ceiling on a single font file.
pub const DEFAULT_MAX_FONT_SIZE: u64 = 64 * 1024 * 1024;

/// Outcome for one font slot.
pub type FontResult = Result<FontMetrics, FontError>;

/// Shared stop flag. Fonts not yet started are marked cancelled; fonts
/// already being read run to completion.
///
/// Library API for embedders driving a [`BatchRunner`] themselves (a
/// service with a shutdown path, say). The `font-catalog` binary runs every
/// batch to completion and never cancels.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    /// Worker threads; `None` lets rayon pick (one per CPU).
    pub jobs: Option<usize>,
    pub max_font_size: u64,
    pub parse_options: ParseOptions,
    cancel: CancelToken,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRunner {
    pub fn new() -> Self {
        BatchRunner {
            jobs: None,
            max_font_size: DEFAULT_MAX_FONT_SIZE,
            parse_options: ParseOptions::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_max_font_size(mut self, limit: u64) -> Self {
        self.max_font_size = limit;
        self
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Share an existing token, e.g. one already wired to a shutdown signal.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle for stopping the run from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Extract metrics for every font of every family.
    ///
    /// The outer `Result` only fails if the worker pool can't be built.
    pub fn run(&self, families: &[FontFamilyRecord]) -> Result<Vec<Vec<FontResult>>, CatalogError> {
        let total: usize = families.iter().map(|f| f.fonts.len()).sum();
        log::info!("extracting metrics for {} fonts in {} families", total, families.len());

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder.build().map_err(|e| {
            CatalogError::io("building worker pool", std::io::Error::other(e))
        })?;

        // Indexed parallel iterators keep their input order on collect.
        let results = pool.install(|| {
            families
                .par_iter()
                .map(|family| {
                    family
                        .fonts
                        .par_iter()
                        .map(|font| self.extract_one(&font.path))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        });

        let failed = results.iter().flatten().filter(|r| r.is_err()).count();
        log::info!("{} fonts extracted, {} failed", total - failed, failed);
        Ok(results)
    }

    /// Read and parse a single file, logging any failure.
    pub fn extract_one(&self, path: &Path) -> FontResult {
        if self.cancel.is_cancelled() {
            return Err(FontError::Cancelled {
                path: path.to_path_buf(),
            });
        }
        let result = read_font(path, self.max_font_size).and_then(|data| {
            extract_metrics_with(&data, self.parse_options).map_err(|source| FontError::Parse {
                path: path.to_path_buf(),
                source,
            })
        });
        if let Err(e) = &result {
            log::warn!("reading {}", e);
        }
        result
    }
}

/// Read a whole regular file, never holding more than `limit + 1` bytes.
///
/// The declared size is only a first filter; the read itself is capped, so
/// a file that grows after the check still can't exceed the limit.
pub fn read_font(path: &Path, limit: u64) -> Result<Vec<u8>, FontError> {
    let io_error = |source| FontError::Io {
        path: path.to_path_buf(),
        source,
    };
    let too_large = |size| FontError::TooLarge {
        path: path.to_path_buf(),
        size,
        limit,
    };
    let not_a_file = || FontError::NotAFile {
        path: path.to_path_buf(),
    };

    // Checked before opening: opening a FIFO for reading blocks.
    if !fs::metadata(path).map_err(io_error)?.is_file() {
        return Err(not_a_file());
    }
    let file = File::open(path).map_err(io_error)?;
    let metadata = file.metadata().map_err(io_error)?;
    if !metadata.is_file() {
        return Err(not_a_file());
    }
    if metadata.len() > limit {
        return Err(too_large(metadata.len()));
    }

    match read_capped(file, metadata.len(), limit).map_err(io_error)? {
        Some(data) => Ok(data),
        None => Err(too_large(limit.saturating_add(1))),
    }
}

/// Read `reader` to the end, or `None` once more than `limit` bytes arrive.
fn read_capped<R: Read>(reader: R, size_hint: u64, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut data = Vec::with_capacity(size_hint.min(limit) as usize);
    reader.take(limit.saturating_add(1)).read_to_end(&mut data)?;
    if data.len() as u64 > limit {
        return Ok(None);
    }
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FontFileRef;
    use std::path::PathBuf;

    fn family(paths: &[PathBuf]) -> FontFamilyRecord {
        FontFamilyRecord {
            name: "Test".to_string(),
            date_added: "2020-01-01".to_string(),
            designer: "Nobody".to_string(),
            aliases: vec![],
            fonts: paths
                .iter()
                .map(|p| FontFileRef {
                    full_name: "Test Regular".to_string(),
                    path: p.clone(),
                    weight: 400,
                    style: "normal".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_read_font_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.ttf");
        fs::write(&path, [0u8; 100]).unwrap();
        assert!(matches!(
            read_font(&path, 99),
            Err(FontError::TooLarge { size: 100, limit: 99, .. })
        ));
        assert_eq!(read_font(&path, 100).unwrap().len(), 100);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_font_rejects_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        let status = std::process::Command::new("mkfifo").arg(&path).status().unwrap();
        assert!(status.success());
        // Must return without waiting for a writer.
        assert!(matches!(
            read_font(&path, 1024),
            Err(FontError::NotAFile { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_font_rejects_device() {
        // Reports a length of zero but never ends.
        assert!(matches!(
            read_font(Path::new("/dev/zero"), 1024),
            Err(FontError::NotAFile { .. })
        ));
    }

    #[test]
    fn test_read_capped_stops_endless_input() {
        let endless = std::io::repeat(0xAB);
        assert_eq!(read_capped(endless, 0, 4096).unwrap(), None);

        let short = &[1u8, 2, 3][..];
        assert_eq!(read_capped(short, 3, 3).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_read_font_limit_is_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.ttf");
        fs::write(&path, [7u8; 10]).unwrap();
        assert_eq!(read_font(&path, 10).unwrap(), vec![7u8; 10]);
        assert!(read_font(&path, 9).is_err());
        assert_eq!(read_font(&path, u64::MAX).unwrap().len(), 10);
    }

    #[test]
    fn test_missing_file_is_slot_error() {
        let dir = tempfile::tempdir().unwrap();
        let families = vec![family(&[dir.path().join("absent.ttf")]), family(&[])];
        let results = BatchRunner::new().with_jobs(Some(2)).run(&families).unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0][0], Err(FontError::Io { .. })));
        assert!(results[1].is_empty());
    }

    #[test]
    fn test_cancelled_batch_fills_every_slot() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..4).map(|i| dir.path().join(format!("{}.ttf", i))).collect();
        for path in &paths {
            fs::write(path, b"garbage").unwrap();
        }
        let token = CancelToken::new();
        let runner = BatchRunner::new().with_cancel_token(token.clone());
        token.cancel();

        let results = runner.run(&[family(&paths[..3]), family(&paths[3..])]).unwrap();
        assert_eq!(results.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 1]);
        assert!(results
            .iter()
            .flatten()
            .all(|r| matches!(r, Err(FontError::Cancelled { .. }))));
    }

    #[test]
    fn test_cancelled_runner_skips_work() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.ttf");
        fs::write(&path, b"garbage").unwrap();
        let runner = BatchRunner::new();
        runner.cancel_token().cancel();
        assert!(matches!(
            runner.extract_one(&path),
            Err(FontError::Cancelled { .. })
        ));
    }
}

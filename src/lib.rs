//! # Font Catalog
//!
//! Catalogues a repository of font families and extracts vertical metrics
//! (units per em, ascent, descent, line height) from every font file it
//! references.
//!
//! Metrics come straight from the sfnt container: the table directory is
//! parsed with explicit bounds checks and the `head` and `hhea` tables are
//! decoded by hand. No rasterizer or shaping library is involved.
//!
//! ## Architecture
//!
//! ```text
//! Repository checkout
//!       ↓
//!   [repo]       — clone on first run, reuse afterwards
//!       ↓
//!   [metadata]   — METADATA.pb → FontFamilyRecord list
//!       ↓
//!   [batch]      — worker pool, one task per font file
//!       ↓          └─ [sfnt] bytes → FontMetrics | ParseError
//!   [report] / [manifest]
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod repo;
pub mod report;
pub mod sfnt;

use std::io::Write;

pub use config::Config;
pub use error::{CatalogError, FontError, ParseError};
pub use sfnt::{extract_metrics, FontMetrics};

/// Run the whole pipeline for `config`, printing the report to `out`.
///
/// Only fatal errors are returned; per-font failures end up in the report
/// and manifest.
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<(), CatalogError> {
    let repo_path = repo::ensure_repo(&config.workdir, &config.fontrepo, &config.fontbranch)?;
    let families = metadata::load_families(&repo_path)?;

    let results = config.batch_runner().run(&families)?;

    if !config.no_report {
        report::write_report(out, &families, &results)
            .map_err(|e| CatalogError::io("writing report", e))?;
    }
    manifest::write_manifest(&config.manifest, &families, &results)
}

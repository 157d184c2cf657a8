//! Run configuration, parsed from the command line.

use std::path::PathBuf;

use crate::batch::{BatchRunner, DEFAULT_MAX_FONT_SIZE};
use crate::sfnt::ParseOptions;

/// Catalogue a font metadata repository and extract per-font metrics.
#[derive(clap::Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "font-catalog", version)]
pub struct Config {
    /// The working directory; the repository is checked out under it
    #[arg(long, default_value = ".font-cache")]
    pub workdir: PathBuf,
    /// The font metadata repository
    #[arg(long, default_value = "https://github.com/google/fonts.git")]
    pub fontrepo: String,
    /// The repository branch to clone
    #[arg(long, default_value = "master")]
    pub fontbranch: String,
    /// Where to write the JSON manifest
    #[arg(long, default_value = "fonts.json")]
    pub manifest: PathBuf,
    /// Number of extraction workers (defaults to one per CPU)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
    /// Skip font files larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FONT_SIZE)]
    pub max_font_size: u64,
    /// Reject fonts whose head/hhea checksums don't match
    #[arg(long)]
    pub verify_checksums: bool,
    /// Don't print the per-family report to stdout
    #[arg(long)]
    pub no_report: bool,
}

impl Config {
    pub fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new()
            .with_jobs(self.jobs)
            .with_max_font_size(self.max_font_size)
            .with_parse_options(ParseOptions {
                verify_checksums: self.verify_checksums,
            })
    }
}

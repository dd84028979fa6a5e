use std::path::{Path, PathBuf};

use clap::Parser;

/// Path value meaning "standard input" or "standard output".
pub const STDIO_PATH: &str = "-";

/// Command-line parameters.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "splitmerge",
    about = "Merge split local alignments of the same read into chimeric PSL records.\n\
             Input PSL must be sorted by query id, target id, query start and target start.",
    version
)]
pub struct Parameters {
    // ── Input / output ──────────────────────────────────────────────────
    /// Input PSL file ('-' for stdin, '.gz' is decompressed)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output PSL file with the merged chimeric alignments ('-' for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output text file with ids of reads which have unmapped clippings
    #[arg(short = 'r', long = "clipped-reads-ids")]
    pub clipped_reads_ids: Option<PathBuf>,

    /// Output text file with reference ids on which the clipped reads are mapped
    #[arg(short = 's', long = "clipped-reads-refs")]
    pub clipped_reads_refs: Option<PathBuf>,

    // ── Merging ─────────────────────────────────────────────────────────
    /// Minimum size of clipping reported in '--clipped-reads-ids'
    #[arg(short = 'c', long = "clip-min", default_value_t = 10)]
    pub clip_min: u32,

    /// Remove from read ids everything after '__' (and '__' itself)
    #[arg(short = 'x', long = "remove-extra")]
    pub remove_extra: bool,

    /// Fail if the input is not sorted by query id, target id, query start, target start
    #[arg(long = "check-sorted")]
    pub check_sorted: bool,
}

impl Parameters {
    /// Input path; only valid after `validate()` succeeded.
    pub fn input_path(&self) -> &Path {
        self.input.as_deref().unwrap_or(Path::new(STDIO_PATH))
    }

    /// Output path; only valid after `validate()` succeeded.
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(Path::new(STDIO_PATH))
    }

    /// True when both required paths were given.
    pub fn has_required_paths(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    /// Validate parameter combinations that clap alone cannot enforce.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        if self.input.is_none() {
            return Err(crate::error::Error::Parameter(
                "--input is required".into(),
            ));
        }

        if self.output.is_none() {
            return Err(crate::error::Error::Parameter(
                "--output is required".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Buffered PSL output

use crate::error::Error;
use crate::params::STDIO_PATH;
use crate::psl::record::{strip_name_suffix, PslRecord};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Records (or lines) held in memory before a write is issued.
pub const FLUSH_THRESHOLD: usize = 100_000;

/// Separator introduced by the upstream read de-duplication step.
pub const NAME_SUFFIX_SEPARATOR: &str = "__";

/// Open `path` for writing, or stdout for `-`.
pub(crate) fn create_output(path: &Path) -> Result<Box<dyn Write>, Error> {
    if path == Path::new(STDIO_PATH) {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).map_err(|e| Error::io(e, path))?;
    Ok(Box::new(file))
}

/// Writer for merged PSL records
pub struct PslWriter {
    writer: BufWriter<Box<dyn Write>>,
    path: PathBuf,
    pending: Vec<PslRecord>,
    strip_suffix: bool,
    written: u64,
}

impl PslWriter {
    /// Create the output file. With `strip_suffix`, query ids are cut at
    /// the first [`NAME_SUFFIX_SEPARATOR`] when written.
    pub fn create(path: &Path, strip_suffix: bool) -> Result<Self, Error> {
        let inner = create_output(path)?;
        Ok(Self::from_writer(inner, path, strip_suffix))
    }

    pub fn from_writer(inner: Box<dyn Write>, path: &Path, strip_suffix: bool) -> Self {
        Self {
            writer: BufWriter::new(inner),
            path: path.to_path_buf(),
            pending: Vec::new(),
            strip_suffix,
            written: 0,
        }
    }

    /// Queue a record; the queue is written once it reaches [`FLUSH_THRESHOLD`].
    pub fn push(&mut self, record: PslRecord) -> Result<(), Error> {
        self.pending.push(record);
        if self.pending.len() >= FLUSH_THRESHOLD {
            self.write_pending()?;
        }
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn write_pending(&mut self) -> Result<(), Error> {
        for record in self.pending.drain(..) {
            let q_name = if self.strip_suffix {
                strip_name_suffix(&record.q_name, NAME_SUFFIX_SEPARATOR)
            } else {
                &record.q_name
            };
            writeln!(self.writer, "{}", record.display_as(q_name))
                .map_err(|e| Error::io(e, &self.path))?;
            self.written += 1;
        }
        Ok(())
    }

    /// Write what is still queued and flush. Returns the records written.
    pub fn finish(mut self) -> Result<u64, Error> {
        self.write_pending()?;
        self.writer.flush().map_err(|e| Error::io(e, &self.path))?;
        Ok(self.written)
    }
}

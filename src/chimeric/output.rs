// Clipped-reads id/reference file writer

use crate::chimeric::clip::ClipReport;
use crate::error::Error;
use crate::psl::{create_output, FLUSH_THRESHOLD};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One buffered line-oriented output file
struct LineSink {
    writer: BufWriter<Box<dyn Write>>,
    path: PathBuf,
    pending: Vec<String>,
}

impl LineSink {
    fn create(path: &Path) -> Result<Self, Error> {
        Ok(Self {
            writer: BufWriter::new(create_output(path)?),
            path: path.to_path_buf(),
            pending: Vec::new(),
        })
    }

    fn push(&mut self, line: String) -> Result<(), Error> {
        self.pending.push(line);
        if self.pending.len() >= FLUSH_THRESHOLD {
            self.write_pending()?;
        }
        Ok(())
    }

    fn write_pending(&mut self) -> Result<(), Error> {
        for line in self.pending.drain(..) {
            self.writer
                .write_all(line.as_bytes())
                .map_err(|e| Error::io(e, &self.path))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), Error> {
        self.write_pending()?;
        self.writer.flush().map_err(|e| Error::io(e, &self.path))
    }
}

/// Writer for the clipped-reads ids file and its optional reference file
///
/// Ids lines are `query_id<TAB>cut`; the reference file gets the target
/// id of each accepted report, so line N of both files belong together.
pub struct ClipReportWriter {
    ids: LineSink,
    refs: Option<LineSink>,
    last_line: Option<String>,
    accepted: u64,
    duplicates: u64,
}

impl ClipReportWriter {
    pub fn create(ids_path: &Path, refs_path: Option<&Path>) -> Result<Self, Error> {
        let ids = LineSink::create(ids_path)?;
        let refs = refs_path.map(LineSink::create).transpose()?;
        Ok(Self {
            ids,
            refs,
            last_line: None,
            accepted: 0,
            duplicates: 0,
        })
    }

    /// Queue a report unless it repeats the previous accepted line.
    ///
    /// Returns whether the report was accepted.
    pub fn push(&mut self, report: &ClipReport) -> Result<bool, Error> {
        let line = format!("{}\t{}\n", report.query_name, report.cut);
        if self.last_line.as_deref() == Some(line.as_str()) {
            self.duplicates += 1;
            return Ok(false);
        }

        self.last_line = Some(line.clone());
        self.ids.push(line)?;
        if let Some(refs) = &mut self.refs {
            refs.push(format!("{}\n", report.target_name))?;
        }
        self.accepted += 1;
        Ok(true)
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Write all queued lines and flush both files.
    pub fn finish(self) -> Result<(), Error> {
        self.ids.finish()?;
        if let Some(refs) = self.refs {
            refs.finish()?;
        }
        Ok(())
    }
}

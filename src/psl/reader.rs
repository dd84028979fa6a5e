/// Streaming PSL reader with transparent gzip support
use crate::error::Error;
use crate::params::STDIO_PATH;
use crate::psl::record::PslRecord;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Decodes PSL lines into [`PslRecord`]s, one per non-blank line.
pub struct PslReader {
    inner: Box<dyn BufRead>,
    path: PathBuf,
    line_no: usize,
    buf: String,
}

impl PslReader {
    /// Open a PSL file (plain or gzip compressed), or stdin for `-`.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let reader: Box<dyn BufRead> = if path == Path::new(STDIO_PATH) {
            Box::new(BufReader::new(io::stdin()))
        } else {
            let path_str = path.to_string_lossy();
            let is_gzipped = path_str.ends_with(".gz") || path_str.ends_with(".gzip");

            let file = File::open(path).map_err(|e| Error::io(e, path))?;

            if is_gzipped {
                Box::new(BufReader::new(MultiGzDecoder::new(file)))
            } else {
                Box::new(BufReader::new(file))
            }
        };

        Ok(Self {
            inner: reader,
            path: path.to_path_buf(),
            line_no: 0,
            buf: String::new(),
        })
    }

    /// Wrap an already open reader, e.g. an in-memory buffer.
    pub fn new(reader: impl BufRead + 'static) -> Self {
        Self {
            inner: Box::new(reader),
            path: PathBuf::from("<stream>"),
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Number of physical lines consumed so far
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Next decoded record, skipping blank lines.
    pub fn next_record(&mut self) -> Result<Option<PslRecord>, Error> {
        loop {
            self.buf.clear();
            let n = self
                .inner
                .read_line(&mut self.buf)
                .map_err(|e| Error::io(e, &self.path))?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }
            return PslRecord::from_line(line, self.line_no).map(Some);
        }
    }
}

impl Iterator for PslReader {
    type Item = Result<PslRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

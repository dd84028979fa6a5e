// PSL alignment record and its comma-terminated block lists

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Number of positional fields in a PSL line.
pub const PSL_FIELDS: usize = 21;

/// Query orientation of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn as_char(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl FromStr for Strand {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Forward),
            "-" => Ok(Self::Reverse),
            _ => Err(format!("unknown strand '{s}'; expected '+' or '-'")),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Ordered integer list stored in PSL as `"a,b,c,"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList(Vec<i64>);

impl BlockList {
    pub fn new(values: Vec<i64>) -> Self {
        Self(values)
    }

    /// Parse a comma-separated list. The trailing comma written by PSL
    /// producers is optional; an empty field is an empty list.
    pub fn parse(s: &str) -> Result<Self, String> {
        let body = s.strip_suffix(',').unwrap_or(s);
        if body.is_empty() {
            return Ok(Self::default());
        }
        body.split(',')
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|e| format!("invalid list value '{v}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy with `delta` added to the first value (no-op on an empty list).
    pub fn with_first_adjusted(&self, delta: i64) -> Self {
        let mut values = self.0.clone();
        if let Some(v) = values.first_mut() {
            *v += delta;
        }
        Self(values)
    }

    /// Copy with `delta` added to the last value (no-op on an empty list).
    pub fn with_last_adjusted(&self, delta: i64) -> Self {
        let mut values = self.0.clone();
        if let Some(v) = values.last_mut() {
            *v += delta;
        }
        Self(values)
    }

    /// `self` followed by `other`, in order.
    pub fn concat(&self, other: &BlockList) -> Self {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend_from_slice(&self.0);
        values.extend_from_slice(&other.0);
        Self(values)
    }
}

impl fmt::Display for BlockList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.0 {
            write!(f, "{v},")?;
        }
        Ok(())
    }
}

/// Grouping key shared by all records of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkKey<'a> {
    pub q_name: &'a str,
    pub t_name: &'a str,
    pub strand: Strand,
}

/// One local alignment of a query (read) against a target, in PSL layout.
///
/// Numeric fields are signed: the merge bookkeeping may move counters
/// below zero and the value is written back as computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PslRecord {
    pub matches: i64,
    pub mismatches: i64,
    pub rep_matches: i64,
    pub n_count: i64,
    pub q_num_insert: i64,
    pub q_base_insert: i64,
    pub t_num_insert: i64,
    pub t_base_insert: i64,
    pub strand: Strand,
    pub q_name: String,
    pub q_size: i64,
    pub q_start: i64,
    pub q_end: i64,
    pub t_name: String,
    pub t_size: i64,
    pub t_start: i64,
    pub t_end: i64,
    pub block_count: i64,
    pub block_sizes: BlockList,
    pub q_starts: BlockList,
    pub t_starts: BlockList,
}

fn parse_int(field: &str, name: &str, line: usize) -> Result<i64, Error> {
    field
        .trim()
        .parse()
        .map_err(|e| Error::format(line, format!("invalid {name} '{field}': {e}")))
}

fn parse_list(field: &str, name: &str, line: usize) -> Result<BlockList, Error> {
    BlockList::parse(field).map_err(|e| Error::format(line, format!("{name}: {e}")))
}

impl PslRecord {
    /// Decode one tab-separated PSL line. Fields past the 21st are ignored.
    ///
    /// `line` is the 1-based input line number used in error messages.
    pub fn from_line(text: &str, line: usize) -> Result<Self, Error> {
        let fields: Vec<&str> = text.split('\t').collect();
        if fields.len() < PSL_FIELDS {
            return Err(Error::format(
                line,
                format!("expected {PSL_FIELDS} fields, found {}", fields.len()),
            ));
        }

        let strand = fields[8]
            .parse::<Strand>()
            .map_err(|e| Error::format(line, e))?;

        let record = Self {
            matches: parse_int(fields[0], "matches", line)?,
            mismatches: parse_int(fields[1], "misMatches", line)?,
            rep_matches: parse_int(fields[2], "repMatches", line)?,
            n_count: parse_int(fields[3], "nCount", line)?,
            q_num_insert: parse_int(fields[4], "qNumInsert", line)?,
            q_base_insert: parse_int(fields[5], "qBaseInsert", line)?,
            t_num_insert: parse_int(fields[6], "tNumInsert", line)?,
            t_base_insert: parse_int(fields[7], "tBaseInsert", line)?,
            strand,
            q_name: fields[9].to_string(),
            q_size: parse_int(fields[10], "qSize", line)?,
            q_start: parse_int(fields[11], "qStart", line)?,
            q_end: parse_int(fields[12], "qEnd", line)?,
            t_name: fields[13].to_string(),
            t_size: parse_int(fields[14], "tSize", line)?,
            t_start: parse_int(fields[15], "tStart", line)?,
            t_end: parse_int(fields[16], "tEnd", line)?,
            block_count: parse_int(fields[17], "blockCount", line)?,
            block_sizes: parse_list(fields[18], "blockSizes", line)?,
            q_starts: parse_list(fields[19], "qStarts", line)?,
            t_starts: parse_list(fields[20], "tStarts", line)?,
        };

        let n = record.block_count;
        for (name, list) in [
            ("blockSizes", &record.block_sizes),
            ("qStarts", &record.q_starts),
            ("tStarts", &record.t_starts),
        ] {
            if list.len() as i64 != n {
                return Err(Error::format(
                    line,
                    format!("blockCount is {n} but {name} has {} values", list.len()),
                ));
            }
        }

        Ok(record)
    }

    pub fn key(&self) -> ChunkKey<'_> {
        ChunkKey {
            q_name: &self.q_name,
            t_name: &self.t_name,
            strand: self.strand,
        }
    }

    /// Aligned length on the query axis
    pub fn query_aligned_len(&self) -> i64 {
        self.q_end - self.q_start
    }

    /// Query bases left outside `[q_start, q_end)`
    pub fn unmapped_flank(&self) -> i64 {
        self.q_size - self.query_aligned_len()
    }

    /// Serialize with `q_name` replaced, e.g. by a stripped id.
    pub fn display_as<'a>(&'a self, q_name: &'a str) -> PslLine<'a> {
        PslLine {
            record: self,
            q_name,
        }
    }
}

/// Query id with everything from the first `separator` onward removed.
pub fn strip_name_suffix<'a>(name: &'a str, separator: &str) -> &'a str {
    name.split_once(separator).map_or(name, |(head, _)| head)
}

/// A record formatted as a PSL line (no newline) under a given query id.
pub struct PslLine<'a> {
    record: &'a PslRecord,
    q_name: &'a str,
}

impl fmt::Display for PslLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.record;
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.matches,
            r.mismatches,
            r.rep_matches,
            r.n_count,
            r.q_num_insert,
            r.q_base_insert,
            r.t_num_insert,
            r.t_base_insert,
            r.strand,
            self.q_name,
            r.q_size,
            r.q_start,
            r.q_end,
            r.t_name,
            r.t_size,
            r.t_start,
            r.t_end,
            r.block_count,
            r.block_sizes,
            r.q_starts,
            r.t_starts,
        )
    }
}

impl fmt::Display for PslRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_as(&self.q_name).fmt(f)
    }
}

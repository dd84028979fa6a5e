// Grouping of a sorted PSL stream into per-read chunks

use crate::error::Error;
use crate::psl::{ChunkKey, PslRecord};
use std::cmp::Ordering;
use std::mem;

/// Consecutive records sharing query id, target id and strand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    records: Vec<PslRecord>,
}

impl Chunk {
    /// Build a chunk from records that already share one key.
    pub fn new(records: Vec<PslRecord>) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].key() == w[1].key()));
        Self { records }
    }

    pub fn records(&self) -> &[PslRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The only record of a size-1 chunk
    pub fn singleton(&self) -> Option<&PslRecord> {
        match self.records.as_slice() {
            [record] => Some(record),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<ChunkKey<'_>> {
        self.records.first().map(PslRecord::key)
    }
}

/// Splits a record stream at every change of (query id, target id, strand).
///
/// Input must be sorted by query id, target id, query start and target
/// start. Unsorted input is not an error unless `check_order` is set; it
/// only fragments the chunks.
pub struct ChunkGrouper<I> {
    records: I,
    current: Vec<PslRecord>,
    check_order: bool,
    previous: Option<SortKey>,
    n_records: u64,
    done: bool,
}

#[derive(Debug, Clone)]
struct SortKey {
    q_name: String,
    t_name: String,
    q_start: i64,
    t_start: i64,
}

impl SortKey {
    fn of(record: &PslRecord) -> Self {
        Self {
            q_name: record.q_name.clone(),
            t_name: record.t_name.clone(),
            q_start: record.q_start,
            t_start: record.t_start,
        }
    }

    fn cmp_record(&self, record: &PslRecord) -> Ordering {
        self.q_name
            .as_bytes()
            .cmp(record.q_name.as_bytes())
            .then_with(|| self.t_name.as_bytes().cmp(record.t_name.as_bytes()))
            .then_with(|| self.q_start.cmp(&record.q_start))
            .then_with(|| self.t_start.cmp(&record.t_start))
    }
}

impl<I> ChunkGrouper<I>
where
    I: Iterator<Item = Result<PslRecord, Error>>,
{
    pub fn new(records: I) -> Self {
        Self {
            records,
            current: Vec::new(),
            check_order: false,
            previous: None,
            n_records: 0,
            done: false,
        }
    }

    /// Fail on the first record that sorts before its predecessor.
    pub fn with_order_check(mut self, check_order: bool) -> Self {
        self.check_order = check_order;
        self
    }

    /// Records pulled from the underlying stream so far
    pub fn records_read(&self) -> u64 {
        self.n_records
    }

    fn check_sorted(&mut self, record: &PslRecord) -> Result<(), Error> {
        if let Some(prev) = &self.previous {
            if prev.cmp_record(record) == Ordering::Greater {
                return Err(Error::Unsorted {
                    record: self.n_records,
                    message: format!(
                        "{} {} {} {} follows {} {} {} {}",
                        record.q_name,
                        record.t_name,
                        record.q_start,
                        record.t_start,
                        prev.q_name,
                        prev.t_name,
                        prev.q_start,
                        prev.t_start
                    ),
                });
            }
        }
        self.previous = Some(SortKey::of(record));
        Ok(())
    }

    fn take_current(&mut self) -> Option<Chunk> {
        if self.current.is_empty() {
            None
        } else {
            Some(Chunk::new(mem::take(&mut self.current)))
        }
    }
}

impl<I> Iterator for ChunkGrouper<I>
where
    I: Iterator<Item = Result<PslRecord, Error>>,
{
    type Item = Result<Chunk, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.records.next() {
                Some(Ok(record)) => {
                    self.n_records += 1;
                    if self.check_order {
                        if let Err(e) = self.check_sorted(&record) {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }

                    let boundary = self
                        .current
                        .last()
                        .is_some_and(|last| last.key() != record.key());
                    if boundary {
                        let chunk = mem::replace(&mut self.current, vec![record]);
                        return Some(Ok(Chunk::new(chunk)));
                    }
                    self.current.push(record);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return self.take_current().map(Ok);
                }
            }
        }
    }
}

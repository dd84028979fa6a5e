// Clipped-read detection for reads with a single local alignment

use crate::psl::{PslRecord, Strand};
use crate::utils::index_max;

/// A read whose alignment leaves an informative unmapped tail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipReport {
    pub query_name: String,
    pub target_name: String,
    /// Query position at which the read should be cut for re-mapping
    pub cut: i64,
}

/// Decides whether a lone alignment leaves a clipped tail worth reporting.
#[derive(Debug, Clone, Copy)]
pub struct ClipDetector {
    clip_min: i64,
}

impl ClipDetector {
    pub fn new(clip_min: u32) -> Self {
        Self {
            clip_min: i64::from(clip_min),
        }
    }

    /// Anchor interval `[left, right)` on the query, in original read orientation.
    ///
    /// Single-block records anchor on `[q_start, q_end)`; otherwise the
    /// largest block (first on ties). Minus-strand intervals are reflected
    /// through the query size.
    pub fn anchor(record: &PslRecord) -> (i64, i64) {
        let (left, right) = match index_max(record.block_sizes.as_slice()) {
            Some(idx) if record.block_count != 1 => {
                let start = record.q_starts.as_slice()[idx];
                (start, start + record.block_sizes.as_slice()[idx])
            }
            _ => (record.q_start, record.q_end),
        };

        match record.strand {
            Strand::Forward => (left, right),
            Strand::Reverse => (record.q_size - right, record.q_size - left),
        }
    }

    /// Cut position for a record that is the only member of its chunk.
    pub fn cut_position(&self, record: &PslRecord) -> Option<i64> {
        if record.unmapped_flank() < self.clip_min {
            return None;
        }

        let (left, right) = Self::anchor(record);
        if left >= self.clip_min {
            Some(left - 1)
        } else if record.q_size - right >= self.clip_min {
            Some(right)
        } else {
            None
        }
    }

    pub fn detect(&self, record: &PslRecord) -> Option<ClipReport> {
        self.cut_position(record).map(|cut| ClipReport {
            query_name: record.q_name.clone(),
            target_name: record.t_name.clone(),
            cut,
        })
    }
}

/// Merge run statistics tracking and reporting
use crate::chimeric::MergeOutcome;
use log::info;

/// Tracks what happened to the chunks and pairs of a run
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MergeStats {
    /// PSL records read
    pub records: u64,
    /// Chunks (runs of one read/target/strand)
    pub chunks: u64,
    /// Chunks holding exactly one record
    pub singleton_chunks: u64,
    /// Unordered pairs examined
    pub pairs: u64,
    /// Pairs skipped for differing strands
    pub strand_mismatch: u64,
    /// Pairs whose target order contradicts the query order
    pub target_order: u64,
    /// Pairs still overlapping after reconciliation
    pub not_adjacent: u64,
    /// Chimeric records produced
    pub merged: u64,
    /// Clip reports written
    pub clip_reports: u64,
    /// Clip reports dropped as repeats of the previous line
    pub clip_duplicates: u64,
}

impl MergeStats {
    /// Create new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a chunk by its size
    pub fn record_chunk(&mut self, len: usize) {
        self.chunks += 1;
        if len == 1 {
            self.singleton_chunks += 1;
        }
    }

    /// Count the outcome of one pair
    pub fn record_pair(&mut self, outcome: &MergeOutcome) {
        self.pairs += 1;
        match outcome {
            MergeOutcome::Merged(_) => self.merged += 1,
            MergeOutcome::StrandMismatch => self.strand_mismatch += 1,
            MergeOutcome::TargetOrder => self.target_order += 1,
            MergeOutcome::NotAdjacent => self.not_adjacent += 1,
        }
    }

    /// Percentage of examined pairs that were merged
    pub fn merged_percent(&self) -> f64 {
        if self.pairs == 0 {
            0.0
        } else {
            100.0 * self.merged as f64 / self.pairs as f64
        }
    }

    /// Print summary statistics to log
    pub fn print_summary(&self) {
        if self.records == 0 {
            info!("No PSL records processed");
            return;
        }

        info!("=== Merge Summary ===");
        info!("PSL records read: {}", self.records);
        info!(
            "Chunks: {} ({} with a single record)",
            self.chunks, self.singleton_chunks
        );
        info!("Pairs examined: {}", self.pairs);
        info!(
            "Merged chimeric records: {} ({:.2}% of pairs)",
            self.merged,
            self.merged_percent()
        );
        info!(
            "Rejected pairs: {} strand, {} target order, {} not adjacent",
            self.strand_mismatch, self.target_order, self.not_adjacent
        );
        if self.clip_reports > 0 || self.clip_duplicates > 0 {
            info!(
                "Clipped reads reported: {} ({} consecutive duplicates dropped)",
                self.clip_reports, self.clip_duplicates
            );
        }
    }
}

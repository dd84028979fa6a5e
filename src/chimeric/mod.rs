// Chimeric alignment reconstruction module
//
// Rebuilds split reads from local alignments reported separately:
// - Grouping of the sorted PSL stream by read, target and strand
// - Pairwise merging of adjacent segments into one chimeric record
// - Reporting of lone alignments that leave a long clipped tail

mod clip;
mod grouper;
mod merge;
mod output;

pub use clip::{ClipDetector, ClipReport};
pub use grouper::{Chunk, ChunkGrouper};
pub use merge::{
    extend_end, is_mergeable, normalize_order, pair_indices, reconcile, synthesize, trim_end,
    trim_start, MergeOutcome, MergeParams, PairMerger, Reconciliation, GAP_TOLERANCE,
    JUNCTION_COUNT, OVERLAP_TOLERANCE,
};
pub use output::ClipReportWriter;

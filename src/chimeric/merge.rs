// Pairwise merging of split alignments into chimeric records

use crate::chimeric::grouper::Chunk;
use crate::psl::PslRecord;
use log::debug;

/// Largest query gap (exclusive) absorbed into the first segment
pub const GAP_TOLERANCE: i64 = 9;

/// Largest query overlap (exclusive) trimmed away before merging
pub const OVERLAP_TOLERANCE: i64 = 17;

/// tNumInsert of a merged record: exactly one chimeric join
pub const JUNCTION_COUNT: i64 = 1;

/// Tolerances used when joining two segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeParams {
    /// A trimmed second segment must stay longer than this
    pub clip_min: i64,
    pub gap_tolerance: i64,
    pub overlap_tolerance: i64,
}

impl MergeParams {
    pub fn new(clip_min: u32) -> Self {
        Self {
            clip_min: i64::from(clip_min),
            gap_tolerance: GAP_TOLERANCE,
            overlap_tolerance: OVERLAP_TOLERANCE,
        }
    }
}

impl Default for MergeParams {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Adjustment applied to a pair before the mergeability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Untouched,
    /// First segment grown forward over a small gap
    ExtendedFirst(i64),
    /// Overlap removed from the head of the second segment
    TrimmedSecond(i64),
    /// Overlap removed from the tail of the first segment
    TrimmedFirst(i64),
}

/// Result of examining one unordered pair of a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged(PslRecord),
    StrandMismatch,
    /// Target coordinates run backwards relative to the query
    TargetOrder,
    /// Segments still overlap after reconciliation
    NotAdjacent,
}

/// Order a pair by query start; ties keep the given order.
pub fn normalize_order<'a>(a: &'a PslRecord, b: &'a PslRecord) -> (&'a PslRecord, &'a PslRecord) {
    if a.q_start > b.q_start {
        (b, a)
    } else {
        (a, b)
    }
}

/// Grow the last block, and the query and target ends, by `dif` bases.
pub fn extend_end(record: &PslRecord, dif: i64) -> PslRecord {
    PslRecord {
        q_end: record.q_end + dif,
        t_end: record.t_end + dif,
        block_sizes: record.block_sizes.with_last_adjusted(dif),
        ..record.clone()
    }
}

/// Drop `dif` bases from the head of the first block, counting them as mismatches.
pub fn trim_start(record: &PslRecord, dif: i64) -> PslRecord {
    PslRecord {
        matches: record.matches - dif,
        mismatches: record.mismatches + dif,
        q_start: record.q_start + dif,
        t_start: record.t_start + dif,
        block_sizes: record.block_sizes.with_first_adjusted(-dif),
        q_starts: record.q_starts.with_first_adjusted(dif),
        t_starts: record.t_starts.with_first_adjusted(dif),
        ..record.clone()
    }
}

/// Drop `dif` bases from the tail of the last block, counting them as mismatches.
pub fn trim_end(record: &PslRecord, dif: i64) -> PslRecord {
    PslRecord {
        matches: record.matches - dif,
        mismatches: record.mismatches + dif,
        q_end: record.q_end - dif,
        t_end: record.t_end - dif,
        block_sizes: record.block_sizes.with_last_adjusted(-dif),
        ..record.clone()
    }
}

/// Close a small query gap or remove a small query overlap between two
/// query-ordered segments.
pub fn reconcile(
    first: &PslRecord,
    second: &PslRecord,
    params: &MergeParams,
) -> (PslRecord, PslRecord, Reconciliation) {
    let gap = second.q_start - first.q_end;

    if gap > 0 && gap < params.gap_tolerance {
        return (
            extend_end(first, gap),
            second.clone(),
            Reconciliation::ExtendedFirst(gap),
        );
    }

    let overlap = -gap;
    if overlap > 0 && overlap < params.overlap_tolerance {
        if second.query_aligned_len() - overlap > params.clip_min {
            return (
                first.clone(),
                trim_start(second, overlap),
                Reconciliation::TrimmedSecond(overlap),
            );
        }
        return (
            trim_end(first, overlap),
            second.clone(),
            Reconciliation::TrimmedFirst(overlap),
        );
    }

    (first.clone(), second.clone(), Reconciliation::Untouched)
}

/// Both axes must be disjoint and in order.
pub fn is_mergeable(first: &PslRecord, second: &PslRecord) -> bool {
    first.q_end <= second.q_start && first.t_end <= second.t_start
}

/// Combine two reconciled segments into one chimeric record.
///
/// Identity, sizes, repMatches and nCount come from `template`.
/// misMatches is `first.mismatches - second.matches`, not the sum of both
/// segments. Kept as is for output compatibility; may go negative.
pub fn synthesize(template: &PslRecord, first: &PslRecord, second: &PslRecord) -> PslRecord {
    PslRecord {
        matches: first.matches + second.matches,
        mismatches: first.mismatches - second.matches,
        rep_matches: template.rep_matches,
        n_count: template.n_count,
        q_num_insert: first.q_num_insert + second.q_num_insert,
        q_base_insert: first.q_base_insert + second.q_base_insert,
        t_num_insert: JUNCTION_COUNT,
        t_base_insert: first.t_base_insert + second.t_base_insert,
        strand: template.strand,
        q_name: template.q_name.clone(),
        q_size: template.q_size,
        q_start: first.q_start,
        q_end: second.q_end,
        t_name: template.t_name.clone(),
        t_size: template.t_size,
        t_start: first.t_start,
        t_end: second.t_end,
        block_count: first.block_count + second.block_count,
        block_sizes: first.block_sizes.concat(&second.block_sizes),
        q_starts: first.q_starts.concat(&second.q_starts),
        t_starts: first.t_starts.concat(&second.t_starts),
    }
}

/// Unordered index pairs `(i, j)`, `i < j`, in lexicographic order.
pub fn pair_indices(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
}

/// Merges geometrically compatible pairs of a chunk
#[derive(Debug, Clone, Copy, Default)]
pub struct PairMerger {
    params: MergeParams,
}

impl PairMerger {
    pub fn new(params: MergeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MergeParams {
        &self.params
    }

    /// Examine one pair; `a` precedes `b` in chunk order.
    pub fn merge_pair(&self, a: &PslRecord, b: &PslRecord) -> MergeOutcome {
        if a.strand != b.strand {
            return MergeOutcome::StrandMismatch;
        }

        let (first, second) = normalize_order(a, b);
        if first.t_start > second.t_start {
            return MergeOutcome::TargetOrder;
        }

        let (first, second, how) = reconcile(first, second, &self.params);
        if !is_mergeable(&first, &second) {
            return MergeOutcome::NotAdjacent;
        }

        let merged = synthesize(a, &first, &second);
        debug!(
            "merged {} on {}: query {}-{} target {}-{} ({:?})",
            merged.q_name,
            merged.t_name,
            merged.q_start,
            merged.q_end,
            merged.t_start,
            merged.t_end,
            how
        );
        MergeOutcome::Merged(merged)
    }

    /// Outcome of every unordered pair of the chunk, in pair order.
    pub fn outcomes<'a>(&'a self, chunk: &'a Chunk) -> impl Iterator<Item = MergeOutcome> + 'a {
        let records = chunk.records();
        pair_indices(records.len()).map(move |(i, j)| self.merge_pair(&records[i], &records[j]))
    }

    /// All merged records of the chunk, one per compatible pair.
    pub fn merge_chunk(&self, chunk: &Chunk) -> Vec<PslRecord> {
        self.outcomes(chunk)
            .filter_map(|outcome| match outcome {
                MergeOutcome::Merged(record) => Some(record),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psl::{BlockList, Strand};

    const T1_A: &str = "46\t34\t0\t0\t0\t0\t0\t0\t-\t2L1/1\t80\t0\t46\tENSG00000143924|ENSG00000171094|163199\t891992\t131997\t132043\t1\t46,\t0,\t131997,";
    const T1_B: &str = "32\t48\t0\t0\t0\t0\t0\t0\t-\t2L1/1\t80\t48\t80\tENSG00000143924|ENSG00000171094|163199\t891992\t861181\t861213\t1\t32,\t48,\t861181,";
    const T2_A: &str = "46\t34\t0\t0\t0\t0\t0\t0\t-\t2L1/1\t80\t0\t46\tENSG00000171094|ENSG00000143924|728793\t891992\t860790\t860836\t1\t46,\t0,\t860790,";
    const T2_B: &str = "32\t48\t0\t0\t0\t0\t0\t0\t-\t2L1/1\t80\t48\t80\tENSG00000171094|ENSG00000143924|728793\t891992\t697982\t698014\t1\t32,\t48,\t697982,";

    fn parse(line: &str) -> PslRecord {
        PslRecord::from_line(line, 1).unwrap()
    }

    /// Single-block forward record
    fn seg(q_start: i64, q_end: i64, t_start: i64) -> PslRecord {
        let len = q_end - q_start;
        PslRecord {
            matches: len,
            mismatches: 100 - len,
            rep_matches: 0,
            n_count: 0,
            q_num_insert: 0,
            q_base_insert: 0,
            t_num_insert: 0,
            t_base_insert: 0,
            strand: Strand::Forward,
            q_name: "read9".to_string(),
            q_size: 100,
            q_start,
            q_end,
            t_name: "chr7".to_string(),
            t_size: 1_000_000,
            t_start,
            t_end: t_start + len,
            block_count: 1,
            block_sizes: BlockList::new(vec![len]),
            q_starts: BlockList::new(vec![q_start]),
            t_starts: BlockList::new(vec![t_start]),
        }
    }

    fn merged(outcome: MergeOutcome) -> PslRecord {
        match outcome {
            MergeOutcome::Merged(record) => record,
            other => panic!("expected a merge, got {:?}", other),
        }
    }

    #[test]
    fn test_documented_pair_merges_across_small_gap() {
        let merger = PairMerger::default();
        let rec = merged(merger.merge_pair(&parse(T1_A), &parse(T1_B)));

        assert_eq!(rec.matches, 78);
        assert_eq!(rec.mismatches, 2);
        assert_eq!(rec.t_num_insert, 1);
        assert_eq!(rec.strand, Strand::Reverse);
        assert_eq!(rec.q_name, "2L1/1");
        assert_eq!((rec.q_start, rec.q_end), (0, 80));
        assert_eq!((rec.t_start, rec.t_end), (131997, 861213));
        assert_eq!(rec.block_count, 2);
        assert_eq!(rec.block_sizes.to_string(), "48,32,");
        assert_eq!(rec.q_starts.to_string(), "0,48,");
        assert_eq!(rec.t_starts.to_string(), "131997,861181,");
        assert_eq!(
            rec.to_string(),
            "78\t2\t0\t0\t0\t0\t1\t0\t-\t2L1/1\t80\t0\t80\tENSG00000143924|ENSG00000171094|163199\t891992\t131997\t861213\t2\t48,32,\t0,48,\t131997,861181,"
        );
    }

    #[test]
    fn test_documented_pair_with_reversed_target_is_skipped() {
        let merger = PairMerger::default();
        assert_eq!(
            merger.merge_pair(&parse(T2_A), &parse(T2_B)),
            MergeOutcome::TargetOrder
        );
    }

    #[test]
    fn test_pair_order_is_normalized_by_query_start() {
        let merger = PairMerger::default();
        let a = parse(T1_A);
        let b = parse(T1_B);
        let rec = merged(merger.merge_pair(&b, &a));
        assert_eq!((rec.q_start, rec.q_end), (0, 80));
        assert_eq!(rec.block_sizes.to_string(), "48,32,");
        // identity fields come from the earlier chunk member
        assert_eq!(rec.q_name, b.q_name);
    }

    #[test]
    fn test_strand_mismatch_is_skipped() {
        let merger = PairMerger::default();
        let a = seg(0, 40, 100);
        let mut b = seg(40, 90, 500);
        b.strand = Strand::Reverse;
        assert_eq!(merger.merge_pair(&a, &b), MergeOutcome::StrandMismatch);
    }

    #[test]
    fn test_exact_abutment_merges_untouched() {
        let a = seg(0, 40, 100);
        let b = seg(40, 90, 500);
        let (first, second, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::Untouched);
        assert_eq!(first, a);
        assert_eq!(second, b);

        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.block_sizes.to_string(), "40,50,");
        assert_eq!(rec.matches, 90);
        assert_eq!(rec.mismatches, 60 - 50);
    }

    #[test]
    fn test_small_gap_extends_first() {
        let a = seg(0, 40, 100);
        let b = seg(48, 90, 500);
        let (first, second, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::ExtendedFirst(8));
        assert_eq!(first.q_end, 48);
        assert_eq!(first.t_end, 148);
        assert_eq!(first.block_sizes.as_slice(), &[48]);
        assert_eq!(first.matches, a.matches);
        assert_eq!(second, b);
    }

    #[test]
    fn test_gap_at_tolerance_is_not_extended_but_still_merges() {
        let a = seg(0, 40, 100);
        let b = seg(49, 90, 500);
        let (_, _, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::Untouched);

        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.block_sizes.to_string(), "40,41,");
        assert_eq!((rec.q_start, rec.q_end), (0, 90));
    }

    #[test]
    fn test_small_overlap_trims_second() {
        let a = seg(0, 50, 1000);
        let b = seg(45, 80, 5000);
        let (first, second, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::TrimmedSecond(5));
        assert_eq!(first, a);
        assert_eq!(second.q_start, 50);
        assert_eq!(second.t_start, 5005);
        assert_eq!(second.matches, 30);
        assert_eq!(second.mismatches, b.mismatches + 5);
        assert_eq!(second.block_sizes.as_slice(), &[30]);
        assert_eq!(second.q_starts.as_slice(), &[50]);
        assert_eq!(second.t_starts.as_slice(), &[5005]);

        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.matches, 80);
        assert_eq!(rec.mismatches, a.mismatches - 30);
        assert_eq!(rec.t_start, 1000);
        assert_eq!(rec.t_end, 5035);
        assert_eq!(rec.t_starts.to_string(), "1000,5005,");
    }

    #[test]
    fn test_overlap_trims_first_when_second_too_short() {
        // second keeps 13 - 5 = 8 bases, not above clip_min
        let a = seg(0, 50, 1000);
        let b = seg(45, 58, 5000);
        let (first, second, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::TrimmedFirst(5));
        assert_eq!(second, b);
        assert_eq!(first.q_end, 45);
        assert_eq!(first.t_end, 1045);
        assert_eq!(first.matches, 45);
        assert_eq!(first.mismatches, a.mismatches + 5);
        assert_eq!(first.block_sizes.as_slice(), &[45]);

        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.block_sizes.to_string(), "45,13,");
        assert_eq!(rec.q_starts.to_string(), "0,45,");
    }

    fn with_blocks(mut rec: PslRecord, sizes: Vec<i64>, q_starts: Vec<i64>, t_starts: Vec<i64>) -> PslRecord {
        rec.block_count = sizes.len() as i64;
        rec.block_sizes = BlockList::new(sizes);
        rec.q_starts = BlockList::new(q_starts);
        rec.t_starts = BlockList::new(t_starts);
        rec
    }

    #[test]
    fn test_trim_second_touches_only_its_first_block() {
        let a = with_blocks(seg(0, 50, 100), vec![20, 30], vec![0, 20], vec![100, 120]);
        let b = with_blocks(seg(45, 85, 500), vec![25, 15], vec![45, 70], vec![500, 525]);

        let (first, second, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::TrimmedSecond(5));
        assert_eq!(first, a);
        assert_eq!(second.block_sizes.as_slice(), &[20, 15]);
        assert_eq!(second.q_starts.as_slice(), &[50, 70]);
        assert_eq!(second.t_starts.as_slice(), &[505, 525]);
        assert_eq!((second.q_end, second.t_end), (85, 540));

        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.block_count, 4);
        assert_eq!(rec.block_sizes.to_string(), "20,30,20,15,");
        assert_eq!(rec.q_starts.to_string(), "0,20,50,70,");
        assert_eq!(rec.t_starts.to_string(), "100,120,505,525,");
    }

    #[test]
    fn test_trim_first_touches_only_its_last_block() {
        // second keeps 12 - 5 = 7 bases, so the first is trimmed
        let a = with_blocks(seg(0, 50, 100), vec![20, 30], vec![0, 20], vec![100, 120]);
        let b = with_blocks(seg(45, 57, 500), vec![5, 7], vec![45, 50], vec![500, 505]);

        let (first, second, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::TrimmedFirst(5));
        assert_eq!(second, b);
        assert_eq!(first.block_sizes.as_slice(), &[20, 25]);
        assert_eq!(first.q_starts.as_slice(), &[0, 20]);
        assert_eq!(first.t_starts.as_slice(), &[100, 120]);
        assert_eq!((first.q_start, first.q_end), (0, 45));
        assert_eq!((first.t_start, first.t_end), (100, 145));

        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.block_sizes.to_string(), "20,25,5,7,");
        assert_eq!(rec.q_starts.to_string(), "0,20,45,50,");
        assert_eq!(rec.t_starts.to_string(), "100,120,500,505,");
    }

    #[test]
    fn test_overlap_equal_to_clip_min_remainder_trims_first() {
        // second keeps exactly clip_min bases
        let a = seg(0, 50, 1000);
        let b = seg(45, 60, 5000);
        let (_, _, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::TrimmedFirst(5));
    }

    #[test]
    fn test_overlap_at_tolerance_is_rejected() {
        let a = seg(0, 50, 1000);
        let b = seg(33, 90, 5000);
        let (_, _, how) = reconcile(&a, &b, &MergeParams::default());
        assert_eq!(how, Reconciliation::Untouched);
        assert_eq!(
            PairMerger::default().merge_pair(&a, &b),
            MergeOutcome::NotAdjacent
        );
    }

    #[test]
    fn test_target_overlap_is_rejected() {
        let a = seg(0, 40, 100);
        let b = seg(40, 90, 120);
        assert_eq!(
            PairMerger::default().merge_pair(&a, &b),
            MergeOutcome::NotAdjacent
        );
    }

    #[test]
    fn test_multi_block_concatenation() {
        let mut a = seg(0, 40, 100);
        a.block_count = 2;
        a.block_sizes = BlockList::new(vec![15, 25]);
        a.q_starts = BlockList::new(vec![0, 15]);
        a.t_starts = BlockList::new(vec![100, 115]);
        let b = seg(43, 90, 700);

        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.block_count, 3);
        assert_eq!(rec.block_sizes.to_string(), "15,28,47,");
        assert_eq!(rec.q_starts.to_string(), "0,15,43,");
        assert_eq!(rec.t_starts.to_string(), "100,115,700,");
    }

    #[test]
    fn test_junction_count_overrides_sum() {
        let mut a = seg(0, 40, 100);
        let mut b = seg(40, 90, 500);
        a.t_num_insert = 2;
        b.t_num_insert = 3;
        a.t_base_insert = 7;
        b.t_base_insert = 4;
        a.q_num_insert = 1;
        b.q_base_insert = 6;
        let rec = merged(PairMerger::default().merge_pair(&a, &b));
        assert_eq!(rec.t_num_insert, JUNCTION_COUNT);
        assert_eq!(rec.t_base_insert, 11);
        assert_eq!(rec.q_num_insert, 1);
        assert_eq!(rec.q_base_insert, 6);
    }

    #[test]
    fn test_inputs_are_not_modified_between_pairs() {
        let a = seg(0, 40, 100);
        let b = seg(45, 70, 500);
        let c = seg(45, 80, 900);
        let chunk = Chunk::new(vec![a.clone(), b.clone(), c.clone()]);
        let merger = PairMerger::default();
        let records = merger.merge_chunk(&chunk);

        // (a, b) and (a, c) merge; (b, c) overlap completely
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].block_sizes.to_string(), "45,25,");
        assert_eq!(records[1].block_sizes.to_string(), "45,35,");
        assert_eq!(chunk.records(), &[a, b, c]);
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_indices(0).count(), 0);
        assert_eq!(pair_indices(1).count(), 0);
        assert_eq!(pair_indices(2).collect::<Vec<_>>(), vec![(0, 1)]);
        assert_eq!(
            pair_indices(4).collect::<Vec<_>>(),
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
        for n in 0..8 {
            assert_eq!(pair_indices(n).count(), n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn test_outcomes_cover_every_pair() {
        let chunk = Chunk::new(vec![seg(0, 20, 0), seg(20, 40, 100), seg(40, 60, 200), seg(60, 80, 300)]);
        let merger = PairMerger::default();
        let outcomes: Vec<_> = merger.outcomes(&chunk).collect();
        assert_eq!(outcomes.len(), 6);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, MergeOutcome::Merged(_))));
    }

    #[test]
    fn test_merged_block_count_and_merge_invariant() {
        let merger = PairMerger::default();
        let cases = [
            (seg(0, 40, 100), seg(40, 90, 500)),
            (seg(0, 40, 100), seg(44, 90, 500)),
            (seg(0, 50, 100), seg(40, 90, 500)),
            (seg(0, 50, 100), seg(40, 55, 500)),
        ];
        for (a, b) in &cases {
            let (first, second, _) = reconcile(a, b, merger.params());
            let rec = merged(merger.merge_pair(a, b));
            assert!(first.q_end <= second.q_start);
            assert!(first.t_end <= second.t_start);
            assert_eq!(rec.block_count, a.block_count + b.block_count);
            assert_eq!(rec.block_sizes.len() as i64, rec.block_count);
        }
    }
}

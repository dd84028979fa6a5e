pub mod chimeric;
pub mod error;
pub mod params;
pub mod psl;
pub mod stats;
pub mod utils;

use log::{info, warn};

use crate::chimeric::{ChunkGrouper, ClipDetector, ClipReportWriter, MergeParams, PairMerger};
use crate::error::Error;
use crate::params::Parameters;
use crate::psl::{PslReader, PslWriter};
use crate::stats::MergeStats;

/// Top-level dispatcher. Called from `main()` after CLI parsing.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    params.validate()?;

    info!("splitmerge v{}", env!("CARGO_PKG_VERSION"));
    info!("input: {}", params.input_path().display());
    info!("output: {}", params.output_path().display());
    if let Some(ids) = &params.clipped_reads_ids {
        info!("clipped-reads-ids: {}", ids.display());
    }
    if let Some(refs) = &params.clipped_reads_refs {
        info!("clipped-reads-refs: {}", refs.display());
    }
    info!("clip-min: {}", params.clip_min);

    let stats = merge_splits(params)?;
    stats.print_summary();

    info!("Merging complete!");
    Ok(())
}

/// Single forward pass: read, group, merge or clip-check, write.
pub fn merge_splits(params: &Parameters) -> Result<MergeStats, Error> {
    let reader = PslReader::open(params.input_path())?;
    let mut writer = PslWriter::create(params.output_path(), params.remove_extra)?;

    let mut clips = match &params.clipped_reads_ids {
        Some(ids) => Some(ClipReportWriter::create(
            ids,
            params.clipped_reads_refs.as_deref(),
        )?),
        None => {
            if params.clipped_reads_refs.is_some() {
                warn!("--clipped-reads-refs is ignored without --clipped-reads-ids");
            }
            None
        }
    };

    let detector = ClipDetector::new(params.clip_min);
    let merger = PairMerger::new(MergeParams::new(params.clip_min));
    let mut stats = MergeStats::new();

    let mut grouper = ChunkGrouper::new(reader).with_order_check(params.check_sorted);
    for chunk in &mut grouper {
        let chunk = chunk?;
        stats.record_chunk(chunk.len());

        if let Some(record) = chunk.singleton() {
            if let Some(clips) = clips.as_mut() {
                if let Some(report) = detector.detect(record) {
                    clips.push(&report)?;
                }
            }
            continue;
        }

        for outcome in merger.outcomes(&chunk) {
            stats.record_pair(&outcome);
            if let chimeric::MergeOutcome::Merged(record) = outcome {
                writer.push(record)?;
            }
        }
    }
    stats.records = grouper.records_read();

    writer.finish()?;
    if let Some(clips) = clips {
        stats.clip_reports = clips.accepted();
        stats.clip_duplicates = clips.duplicates();
        clips.finish()?;
    }

    Ok(stats)
}

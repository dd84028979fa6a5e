/// PSL alignment records
///
/// This module handles:
/// - Decoding the 21-column PSL layout into typed records
/// - Streaming records from plain, gzipped or standard input
/// - Buffered output of merged records
mod reader;
mod record;
mod writer;

pub use reader::PslReader;
pub use record::{strip_name_suffix, BlockList, ChunkKey, PslLine, PslRecord, Strand, PSL_FIELDS};
pub use writer::{PslWriter, FLUSH_THRESHOLD, NAME_SUFFIX_SEPARATOR};

pub(crate) use writer::create_output;

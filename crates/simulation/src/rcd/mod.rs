//! RCD catalog file framing.
//!
//! Catalog data (track pieces, car types, coaster types, platforms) ships in
//! RCD files: a small file header followed by named, versioned, sized blocks.
//! This module only frames blocks and reads fields; `catalog::loader`
//! interprets the payloads.

mod error;
mod reader;
mod writer;


pub(crate) use error::block_name;
pub use error::RcdError;
pub use reader::{
    read_blocks, BlockReader, RcdBlock, BLOCK_HEADER_SIZE, FILE_HEADER_SIZE, FILE_VERSION, MAGIC,
};
pub use writer::{BlockWriter, RcdWriter};

// ---------------------------------------------------------------------------
// reader – RCD file header, block framing and little-endian field reads
// ---------------------------------------------------------------------------
//
// File format (little-endian):
//   [0..4]   Magic bytes: "RCDF"
//   [4..8]   File version (u32, must be FILE_VERSION)
//   then a sequence of blocks, each:
//   [0..4]   Block name (4 ASCII bytes, e.g. "TRCK")
//   [4..8]   Block version (u32)
//   [8..12]  Payload size in bytes (u32)
//   [12..]   Payload
//
// Blocks are numbered from 1 in file order. Block numbers are the ids other
// blocks use to reference them (0 means "no reference").

use super::error::RcdError;

/// Magic bytes identifying an RCD catalog file.
pub const MAGIC: [u8; 4] = *b"RCDF";

/// Supported file format version.
pub const FILE_VERSION: u32 = 1;

/// Size of the file header in bytes.
pub const FILE_HEADER_SIZE: usize = 8;

/// Size of a block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 12;

/// One framed block of an RCD file.
#[derive(Debug, Clone, Copy)]
pub struct RcdBlock<'a> {
    pub number: u32,
    pub name: [u8; 4],
    pub version: u32,
    pub payload: &'a [u8],
}

impl<'a> RcdBlock<'a> {
    /// Start reading the payload.
    pub fn reader(&self) -> BlockReader<'a> {
        BlockReader {
            block: self.number,
            name: self.name,
            data: self.payload,
            pos: 0,
        }
    }

    /// Reject the block unless it has the `expected` version.
    pub fn expect_version(&self, expected: u32) -> Result<(), RcdError> {
        if self.version != expected {
            return Err(RcdError::VersionMismatch {
                name: self.name,
                expected,
                found: self.version,
            });
        }
        Ok(())
    }

    /// Reject the block unless its payload is exactly `expected` bytes.
    pub fn expect_size(&self, expected: usize) -> Result<(), RcdError> {
        if self.payload.len() != expected {
            return Err(RcdError::SizeMismatch {
                name: self.name,
                expected,
                found: self.payload.len(),
            });
        }
        Ok(())
    }
}

/// Validate the file header and split the file into blocks.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not start with the `RCDF` magic
/// - The file version is not [`FILE_VERSION`]
/// - A block header is cut short or its payload runs past the end of the file
pub fn read_blocks(bytes: &[u8]) -> Result<Vec<RcdBlock<'_>>, RcdError> {
    if bytes.len() < FILE_HEADER_SIZE || bytes[..4] != MAGIC {
        return Err(RcdError::BadFileHeader {
            found_version: None,
        });
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FILE_VERSION {
        return Err(RcdError::BadFileHeader {
            found_version: Some(version),
        });
    }

    let mut blocks = Vec::new();
    let mut offset = FILE_HEADER_SIZE;
    let mut number = 1u32;
    while offset < bytes.len() {
        let remaining = bytes.len() - offset;
        if remaining < BLOCK_HEADER_SIZE {
            return Err(RcdError::BlockOverrun {
                block: number,
                size: BLOCK_HEADER_SIZE as u32,
                remaining,
            });
        }
        let header = &bytes[offset..offset + BLOCK_HEADER_SIZE];
        let name = [header[0], header[1], header[2], header[3]];
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let size = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        let start = offset + BLOCK_HEADER_SIZE;
        let available = bytes.len() - start;
        if size as usize > available {
            return Err(RcdError::BlockOverrun {
                block: number,
                size,
                remaining: available,
            });
        }
        blocks.push(RcdBlock {
            number,
            name,
            version,
            payload: &bytes[start..start + size as usize],
        });
        offset = start + size as usize;
        number += 1;
    }
    Ok(blocks)
}

/// Cursor over a block payload with bounds-checked little-endian reads.
#[derive(Debug)]
pub struct BlockReader<'a> {
    block: u32,
    name: [u8; 4],
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlockReader<'a> {
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn bytes(&mut self, count: usize) -> Result<&'a [u8], RcdError> {
        if self.remaining() < count {
            return Err(RcdError::Truncated {
                block: self.block,
                needed: count - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], RcdError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, RcdError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn i8(&mut self) -> Result<i8, RcdError> {
        Ok(i8::from_le_bytes(self.array()?))
    }

    pub fn u16(&mut self) -> Result<u16, RcdError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, RcdError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> Result<f32, RcdError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// Check the whole payload was consumed; blocks with a variable layout
    /// still have an exact expected size once parsed.
    pub fn finish(self) -> Result<(), RcdError> {
        if self.pos != self.data.len() {
            return Err(RcdError::SizeMismatch {
                name: self.name,
                expected: self.pos,
                found: self.data.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// writer – produce RCD files (tooling, fixtures, benchmarks)
// ---------------------------------------------------------------------------

use super::reader::{FILE_VERSION, MAGIC};

/// Builds an RCD file block by block.
///
/// ```ignore
/// let mut rcd = RcdWriter::new();
/// let sprite = rcd.block(*b"8PXL", 2, |_| {});
/// let bytes = rcd.finish();
/// ```
#[derive(Debug)]
pub struct RcdWriter {
    out: Vec<u8>,
    next_block: u32,
}

impl Default for RcdWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RcdWriter {
    pub fn new() -> Self {
        let mut out = Vec::with_capacity(1024);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FILE_VERSION.to_le_bytes());
        Self { out, next_block: 1 }
    }

    /// Append a block; `fill` writes its payload. Returns the block number.
    pub fn block(&mut self, name: [u8; 4], version: u32, fill: impl FnOnce(&mut BlockWriter)) -> u32 {
        let mut payload = BlockWriter::default();
        fill(&mut payload);

        self.out.extend_from_slice(&name);
        self.out.extend_from_slice(&version.to_le_bytes());
        self.out
            .extend_from_slice(&(payload.data.len() as u32).to_le_bytes());
        self.out.extend_from_slice(&payload.data);

        let number = self.next_block;
        self.next_block += 1;
        number
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

/// Little-endian payload writer handed to [`RcdWriter::block`].
#[derive(Debug, Default)]
pub struct BlockWriter {
    data: Vec<u8>,
}

impl BlockWriter {
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.data.push(v);
        self
    }

    pub fn i8(&mut self, v: i8) -> &mut Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.data.extend_from_slice(v);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

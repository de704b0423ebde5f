// ---------------------------------------------------------------------------
// RcdError: typed errors for catalog (RCD) file and block loading
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors raised while reading an RCD catalog file.
///
/// File-level variants (`Io`, `BadFileHeader`, `BlockOverrun`) reject the whole
/// file. The remaining variants reject a single catalog entry; the caller must
/// refuse to register it but may continue with the next block.
#[derive(Debug)]
pub enum RcdError {
    /// I/O error while reading the file.
    Io(std::io::Error),
    /// The file does not start with the `RCDF` magic and a supported version.
    BadFileHeader { found_version: Option<u32> },
    /// A block header announces more payload than the file holds.
    BlockOverrun {
        block: u32,
        size: u32,
        remaining: usize,
    },
    /// A read went past the end of the block payload.
    Truncated { block: u32, needed: usize },
    /// The block has a version this loader does not understand.
    VersionMismatch {
        name: [u8; 4],
        expected: u32,
        found: u32,
    },
    /// The block payload does not have the exact expected size.
    SizeMismatch {
        name: [u8; 4],
        expected: usize,
        found: usize,
    },
    /// A field holds a value outside its allowed range.
    FieldRange { field: &'static str, value: i64 },
    /// A reference points to a block that is not loaded (or has the wrong kind).
    DanglingReference { field: &'static str, block: u32 },
    /// A fixed-capacity table is full.
    TableFull { table: &'static str, capacity: usize },
}

pub(crate) fn block_name(name: &[u8; 4]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

impl fmt::Display for RcdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RcdError::Io(e) => write!(f, "I/O error: {e}"),
            RcdError::BadFileHeader { found_version } => match found_version {
                Some(v) => write!(f, "Not a supported RCD file: file version {v}"),
                None => write!(f, "Not an RCD file: missing RCDF header"),
            },
            RcdError::BlockOverrun {
                block,
                size,
                remaining,
            } => write!(
                f,
                "Block #{block} claims {size} bytes but only {remaining} remain in the file"
            ),
            RcdError::Truncated { block, needed } => {
                write!(f, "Block #{block} is truncated: {needed} more bytes needed")
            }
            RcdError::VersionMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Version mismatch: {} block is v{found}, expected v{expected}",
                block_name(name)
            ),
            RcdError::SizeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Size mismatch: {} block has {found} bytes, expected {expected}",
                block_name(name)
            ),
            RcdError::FieldRange { field, value } => {
                write!(f, "Field {field} out of range: {value}")
            }
            RcdError::DanglingReference { field, block } => {
                write!(f, "Field {field} references unknown block #{block}")
            }
            RcdError::TableFull { table, capacity } => {
                write!(f, "Table {table} is full ({capacity} entries)")
            }
        }
    }
}

impl std::error::Error for RcdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RcdError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RcdError {
    fn from(e: std::io::Error) -> Self {
        RcdError::Io(e)
    }
}

impl RcdError {
    /// Whether the error invalidates the whole file rather than one entry.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            RcdError::Io(_) | RcdError::BadFileHeader { .. } | RcdError::BlockOverrun { .. }
        )
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Version mismatch: expected {expected:#04x}, found {found:#04x}\nThe peers are running incompatible versions or the streams got crossed.")]
    VersionMismatch { expected: u8, found: u8 },

    #[error("Unknown build code header tag {tag:#04x}\nThe code stream is corrupt or misaligned.")]
    UnknownHeader { tag: u8 },

    #[error("Truncated input while reading {what}")]
    Truncated { what: &'static str },

    #[error("Value out of range: {what} = {value}\nThe wire format cannot represent this value.")]
    FieldRange { what: &'static str, value: u64 },

    #[error("Source block {index}: read {got} of {expected} bytes\nThe source file changed or was truncated after its index was built.")]
    SourceIntegrity {
        index: u32,
        expected: usize,
        got: usize,
    },

    #[error("Encoded delta ({encoded} bytes) would exceed the raw target ({read} bytes)\nSend the file whole instead of a delta.")]
    Oversize { encoded: u64, read: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Maps an end-of-stream I/O failure to a truncation error with context.
    /// Other I/O failures pass through unchanged.
    pub(crate) fn from_read(err: std::io::Error, what: &'static str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            SyncError::Truncated { what }
        } else {
            SyncError::Io(err)
        }
    }
}

use crate::layout::Field;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{field} value {value} exceeds its maximum of {max}")]
    OutOfRange { field: Field, value: u64, max: u64 },

    #[error("invalid address layout: {total_bits} bits exceed the {limit} bit address width")]
    InvalidConfiguration { total_bits: u32, limit: u32 },

    #[error("address {address:#x} does not fit the {limit} bit trace format")]
    AddressTooWide { address: u64, limit: u32 },

    #[error("layout spans {total_bits} bits but the trace format holds {limit}")]
    LayoutTooWide { total_bits: u32, limit: u32 },

    #[error("bad trace line {line:?}: {reason}")]
    Parse { line: String, reason: String },

    #[error("could not open file {path:?}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not create directories {path:?}")]
    CreateDirectories {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

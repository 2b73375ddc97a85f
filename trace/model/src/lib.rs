use serde::{Deserialize, Serialize};

/// Kind of a memory access.
///
/// Rendered as the single token the DRAM simulator expects (`W` or `R`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
pub enum Operation {
    #[strum(serialize = "W")]
    #[serde(rename = "W")]
    Write,
    #[strum(serialize = "R")]
    #[serde(rename = "R")]
    Read,
}

impl Operation {
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Operation::Write)
    }
}

/// Position of an access inside the DRAM array, before packing.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccessCoordinate {
    pub row: u64,
    pub bank_group: u64,
    pub bank: u64,
    pub column: u64,
}

impl AccessCoordinate {
    #[must_use]
    pub fn new(row: u64, bank_group: u64, bank: u64, column: u64) -> Self {
        Self {
            row,
            bank_group,
            bank,
            column,
        }
    }
}

impl std::fmt::Display for AccessCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(row={}, bg={}, bank={}, column={})",
            self.row, self.bank_group, self.bank, self.column
        )
    }
}

/// A single line of a memory trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceRecord {
    pub address: u64,
    pub operation: Operation,
}

impl TraceRecord {
    #[must_use]
    pub fn new(address: u64, operation: Operation) -> Self {
        Self { address, operation }
    }

    #[must_use]
    pub fn write(address: u64) -> Self {
        Self::new(address, Operation::Write)
    }

    #[must_use]
    pub fn read(address: u64) -> Self {
        Self::new(address, Operation::Read)
    }
}

/// Formats the record as a trace line without the trailing newline.
///
/// Only the low 32 bits of the address are rendered.
/// Callers that care about wider addresses must reject them beforehand.
impl std::fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X} {}", self.address & 0xFFFF_FFFF, self.operation)
    }
}

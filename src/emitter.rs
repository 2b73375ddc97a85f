use crate::layout::AddressLayout;
use crate::{address, codec, Error};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use trace_model::{AccessCoordinate, Operation, TraceRecord};

/// Records emitted for a single step.
///
/// At most two records per step, kept inline.
pub type Records = SmallVec<[TraceRecord; 2]>;

/// How many records are emitted per coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitMode {
    /// One record with the given operation.
    Single(Operation),
    /// A write immediately followed by a read of the same address.
    WriteThenRead,
}

impl Default for EmitMode {
    fn default() -> Self {
        Self::Single(Operation::Write)
    }
}

impl EmitMode {
    #[must_use]
    pub fn records_per_step(self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::WriteThenRead => 2,
        }
    }
}

impl std::fmt::Display for EmitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(op) => write!(f, "{op}"),
            Self::WriteThenRead => write!(f, "WR"),
        }
    }
}

/// What to do with a coordinate whose fields do not fit the layout.
///
/// Row major traversals run out of columns after `2^(row_bits + column_bits)` steps,
/// the other traversals run out of rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOverflow {
    /// Fail with [`Error::OutOfRange`].
    #[default]
    Reject,
    /// Pack the oversized value anyway and let it spill into the neighbouring field.
    Bleed,
}

/// Builds the records of one step for an already packed address.
#[must_use]
pub fn records(addr: address, mode: EmitMode) -> Records {
    match mode {
        EmitMode::Single(op) => smallvec![TraceRecord::new(addr, op)],
        EmitMode::WriteThenRead => smallvec![TraceRecord::write(addr), TraceRecord::read(addr)],
    }
}

/// Turns coordinates into trace records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEmitter {
    layout: AddressLayout,
    mode: EmitMode,
    overflow: FieldOverflow,
}

impl TraceEmitter {
    #[must_use]
    pub fn new(layout: AddressLayout, mode: EmitMode) -> Self {
        Self {
            layout,
            mode,
            overflow: FieldOverflow::default(),
        }
    }

    #[must_use]
    pub fn with_overflow(mut self, overflow: FieldOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    #[must_use]
    pub fn mode(&self) -> EmitMode {
        self.mode
    }

    pub fn address(&self, coord: &AccessCoordinate) -> Result<address, Error> {
        match self.overflow {
            FieldOverflow::Reject => codec::encode(&self.layout, coord),
            FieldOverflow::Bleed => Ok(codec::encode_unchecked(&self.layout, coord)),
        }
    }

    pub fn emit(&self, coord: &AccessCoordinate) -> Result<Records, Error> {
        let addr = self.address(coord)?;
        Ok(records(addr, self.mode))
    }
}

#[cfg(test)]
mod tests {
    use super::{records, EmitMode, FieldOverflow, TraceEmitter};
    use crate::layout::{AddressLayout, Field};
    use crate::Error;
    use color_eyre::eyre;
    use similar_asserts as diff;
    use trace_model::{AccessCoordinate, Operation, TraceRecord};

    #[test]
    fn test_single_op() {
        let have = records(0x40, EmitMode::Single(Operation::Read));
        diff::assert_eq!(have: have.as_slice(), want: &[TraceRecord::read(0x40)][..]);
        assert!(!have.spilled());

        let have = records(0x40, EmitMode::Single(Operation::Write));
        diff::assert_eq!(have: have.as_slice(), want: &[TraceRecord::write(0x40)][..]);
    }

    #[test]
    fn test_write_then_read() {
        let have = records(0x0040_0008, EmitMode::WriteThenRead);
        diff::assert_eq!(
            have: have.as_slice(),
            want: &[TraceRecord::write(0x0040_0008), TraceRecord::read(0x0040_0008)][..]
        );
        assert!(!have.spilled());
        diff::assert_eq!(have: EmitMode::WriteThenRead.records_per_step(), want: 2);
        diff::assert_eq!(have: EmitMode::default().records_per_step(), want: 1);
    }

    #[test]
    fn test_emit_mode_from_yaml() -> eyre::Result<()> {
        let parse = |yaml: &str| -> Result<EmitMode, serde_yaml::Error> {
            serde_yaml::with::singleton_map::deserialize(serde_yaml::Deserializer::from_str(yaml))
        };
        diff::assert_eq!(have: parse("write_then_read")?, want: EmitMode::WriteThenRead);
        diff::assert_eq!(have: parse("{single: R}")?, want: EmitMode::Single(Operation::Read));
        diff::assert_eq!(have: parse("single: W")?, want: EmitMode::Single(Operation::Write));
        assert!(parse("{double: R}").is_err());
        Ok(())
    }

    #[test]
    fn test_emitter_rejects_overflow() {
        let layout = AddressLayout::default();
        let emitter = TraceEmitter::new(layout, EmitMode::WriteThenRead);
        let err = emitter
            .emit(&AccessCoordinate::new(0, 0, 0, 1024))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange {
                field: Field::Column,
                ..
            }
        ));
    }

    #[test]
    fn test_emitter_bleeds_overflow() -> eyre::Result<()> {
        let layout = AddressLayout::default();
        let emitter = TraceEmitter::new(layout, EmitMode::Single(Operation::Write))
            .with_overflow(FieldOverflow::Bleed);
        let have = emitter.emit(&AccessCoordinate::new(0, 0, 0, 1025))?;
        diff::assert_eq!(have: have.as_slice(), want: &[TraceRecord::write(0x2008)][..]);
        Ok(())
    }
}

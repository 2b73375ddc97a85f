use crate::{address, Error};
use serde::{Deserialize, Serialize};

/// Width of the packed address in bits.
pub const ADDRESS_BITS: u32 = address::BITS;

/// Address fields, ordered from least to most significant.
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
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Offset,
    Column,
    Bank,
    BankGroup,
    Row,
}

impl Field {
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// All ones in the lowest `bits` bits.
#[must_use]
#[inline]
pub fn low_mask(bits: u32) -> address {
    if bits >= ADDRESS_BITS {
        address::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Raw bit widths, as written in a config file.
///
/// Missing fields fall back to the DDR4 layout the traces were built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BitWidths {
    pub offset: u32,
    pub column: u32,
    pub bank: u32,
    pub bank_group: u32,
    pub row: u32,
}

impl Default for BitWidths {
    fn default() -> Self {
        Self {
            offset: 3,
            column: 10,
            bank: 2,
            bank_group: 1,
            row: 16,
        }
    }
}

/// Placement of a field inside the packed address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mask {
    pub mask: address,
    /// Lowest bit (inclusive).
    pub low: u32,
    /// Highest bit (exclusive).
    pub high: u32,
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut out = f.debug_struct("Mask");
        out.field("mask", &format!("{:016x}", self.mask));
        out.field("low", &self.low);
        out.field("high", &self.high);
        out.finish()
    }
}

/// Immutable bit layout of a DRAM address.
///
/// From least to most significant: `offset | column | bank | bank_group | row`.
/// The layout is validated once on construction and is read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BitWidths", into = "BitWidths")]
pub struct AddressLayout {
    bits: [u32; 5],
    shifts: [u32; 5],
}

impl Default for AddressLayout {
    fn default() -> Self {
        Self::place(BitWidths::default())
    }
}

impl TryFrom<BitWidths> for AddressLayout {
    type Error = Error;

    fn try_from(widths: BitWidths) -> Result<Self, Self::Error> {
        Self::from_widths(widths)
    }
}

impl From<AddressLayout> for BitWidths {
    fn from(layout: AddressLayout) -> Self {
        layout.widths()
    }
}

impl AddressLayout {
    pub fn new(
        offset: u32,
        column: u32,
        bank: u32,
        bank_group: u32,
        row: u32,
    ) -> Result<Self, Error> {
        Self::from_widths(BitWidths {
            offset,
            column,
            bank,
            bank_group,
            row,
        })
    }

    pub fn from_widths(widths: BitWidths) -> Result<Self, Error> {
        let BitWidths {
            offset,
            column,
            bank,
            bank_group,
            row,
        } = widths;
        let total_bits: u64 = [offset, column, bank, bank_group, row]
            .into_iter()
            .map(u64::from)
            .sum();
        if total_bits > u64::from(ADDRESS_BITS) {
            return Err(Error::InvalidConfiguration {
                total_bits: u32::try_from(total_bits).unwrap_or(u32::MAX),
                limit: ADDRESS_BITS,
            });
        }
        Ok(Self::place(widths))
    }

    /// Stacks the fields on top of each other, starting at bit zero.
    fn place(widths: BitWidths) -> Self {
        let bits = [
            widths.offset,
            widths.column,
            widths.bank,
            widths.bank_group,
            widths.row,
        ];
        let mut shifts = [0; 5];
        for i in 1..bits.len() {
            shifts[i] = shifts[i - 1] + bits[i - 1];
        }
        Self { bits, shifts }
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, Error> {
        let layout = serde_yaml::from_reader(reader)?;
        Ok(layout)
    }

    #[must_use]
    pub fn widths(&self) -> BitWidths {
        let [offset, column, bank, bank_group, row] = self.bits;
        BitWidths {
            offset,
            column,
            bank,
            bank_group,
            row,
        }
    }

    #[must_use]
    #[inline]
    pub fn bits(&self, field: Field) -> u32 {
        self.bits[field.index()]
    }

    /// Number of bits below the field.
    #[must_use]
    #[inline]
    pub fn shift(&self, field: Field) -> u32 {
        self.shifts[field.index()]
    }

    /// Largest value the field can hold (`2^bits - 1`).
    #[must_use]
    #[inline]
    pub fn max(&self, field: Field) -> u64 {
        low_mask(self.bits(field))
    }

    #[must_use]
    pub fn mask(&self, field: Field) -> Mask {
        let low = self.shift(field);
        let high = low + self.bits(field);
        let mask = if low >= ADDRESS_BITS {
            0
        } else {
            self.max(field) << low
        };
        Mask { mask, low, high }
    }

    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.bits.iter().sum()
    }

    /// Largest combined `(bank_group, bank)` index.
    ///
    /// The bank index holds the bank in its low bits and the bank group above it.
    #[must_use]
    pub fn max_bank_index(&self) -> u64 {
        low_mask(self.bits(Field::Bank) + self.bits(Field::BankGroup))
    }

    /// Number of distinct `(bank_group, bank)` pairs.
    #[must_use]
    pub fn num_banks(&self) -> u64 {
        self.max_bank_index().saturating_add(1)
    }
}

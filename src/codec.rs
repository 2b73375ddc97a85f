//! Packing of access coordinates into addresses and back.
//!
//! Offset bits are never set: every generated address is aligned to a full access.

use crate::layout::{AddressLayout, Field};
use crate::{address, Error};
use bitvec::{field::BitField, BitArr};
use trace_model::AccessCoordinate;

type AddressBits = BitArr!(for 64, in u64);

/// Fields carried by a coordinate, paired with their values.
#[inline]
fn fields(coord: &AccessCoordinate) -> [(Field, u64); 4] {
    [
        (Field::Column, coord.column),
        (Field::Bank, coord.bank),
        (Field::BankGroup, coord.bank_group),
        (Field::Row, coord.row),
    ]
}

/// Packs `coord` into an address.
///
/// # Errors
/// `OutOfRange` if any field exceeds its maximum in `layout`.
pub fn encode(layout: &AddressLayout, coord: &AccessCoordinate) -> Result<address, Error> {
    let mut bits = AddressBits::ZERO;
    for (field, value) in fields(coord) {
        let max = layout.max(field);
        if value > max {
            return Err(Error::OutOfRange { field, value, max });
        }
        let mask = layout.mask(field);
        if mask.low == mask.high {
            // zero width field, value must be zero
            continue;
        }
        bits[mask.low as usize..mask.high as usize].store_le(value);
    }
    Ok(bits.into_inner()[0])
}

/// Packs `coord` without range checks.
///
/// Oversized field values are shifted into place as they are and overwrite
/// the bits of the more significant fields. Bits shifted past the address width are lost.
#[must_use]
pub fn encode_unchecked(layout: &AddressLayout, coord: &AccessCoordinate) -> address {
    fields(coord)
        .into_iter()
        .fold(0, |addr, (field, value)| {
            addr | value.checked_shl(layout.shift(field)).unwrap_or(0)
        })
}

/// Unpacks the row, bank group, bank and column of `addr`.
///
/// The offset bits are ignored.
#[must_use]
pub fn decode(layout: &AddressLayout, addr: address) -> AccessCoordinate {
    let bits = AddressBits::new([addr]);
    let load = |field: Field| -> u64 {
        let mask = layout.mask(field);
        if mask.low == mask.high {
            return 0;
        }
        bits[mask.low as usize..mask.high as usize].load_le()
    };
    AccessCoordinate {
        row: load(Field::Row),
        bank_group: load(Field::BankGroup),
        bank: load(Field::Bank),
        column: load(Field::Column),
    }
}

/// Byte offset bits of `addr`.
#[must_use]
pub fn offset(layout: &AddressLayout, addr: address) -> u64 {
    addr & layout.mask(Field::Offset).mask
}

impl AddressLayout {
    pub fn encode(&self, coord: &AccessCoordinate) -> Result<address, Error> {
        encode(self, coord)
    }

    #[must_use]
    pub fn decode(&self, addr: address) -> AccessCoordinate {
        decode(self, addr)
    }
}

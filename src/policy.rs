//! Traversal orders over the DRAM address space.
//!
//! Every policy is an infinite, allocation free state machine.
//! Callers bound the number of steps, e.g. with [`Iterator::take`].

use crate::layout::{AddressLayout, Field};
use serde::{Deserialize, Serialize};
use trace_model::AccessCoordinate;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TraversalKind {
    /// Column varies fastest, then row.
    #[strum(to_string = "column_major", serialize = "columns")]
    #[serde(alias = "columns")]
    ColumnMajor,
    /// Row varies fastest, the column advances after a full sweep of the rows.
    #[strum(to_string = "row_major", serialize = "rows")]
    #[serde(alias = "rows")]
    RowMajor,
    /// Rotates over all `(bank_group, bank)` pairs, then column, then row.
    #[strum(to_string = "bank_round_robin", serialize = "banks")]
    #[serde(alias = "banks")]
    BankRoundRobin,
}

/// A traversal order.
pub trait TraversalPolicy {
    fn kind(&self) -> TraversalKind;

    /// The coordinate the next step will emit.
    fn cursor(&self) -> AccessCoordinate;

    /// Moves the cursor by one step.
    fn advance(&mut self);

    fn next_coordinate(&mut self) -> AccessCoordinate {
        let coord = self.cursor();
        self.advance();
        coord
    }
}

/// Walks all columns of a row before moving to the next row.
///
/// Bank and bank group stay at zero.
/// The row is not bounded: walking past the last row yields coordinates
/// the codec rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMajor {
    row: u64,
    column: u64,
    max_column: u64,
}

impl ColumnMajor {
    #[must_use]
    pub fn new(layout: &AddressLayout) -> Self {
        Self {
            row: 0,
            column: 0,
            max_column: layout.max(Field::Column),
        }
    }
}

impl TraversalPolicy for ColumnMajor {
    fn kind(&self) -> TraversalKind {
        TraversalKind::ColumnMajor
    }

    fn cursor(&self) -> AccessCoordinate {
        AccessCoordinate::new(self.row, 0, 0, self.column)
    }

    fn advance(&mut self) {
        if self.column < self.max_column {
            self.column += 1;
        } else {
            self.column = 0;
            self.row = self.row.saturating_add(1);
            log::trace!("column major: moved to row {}", self.row);
        }
    }
}

/// Sweeps the full row space at a fixed column before moving to the next column.
///
/// Bank and bank group stay at zero.
/// The column is not bounded: after `2^column_bits` sweeps it leaves the column field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMajor {
    row: u64,
    column: u64,
    max_row: u64,
}

impl RowMajor {
    #[must_use]
    pub fn new(layout: &AddressLayout) -> Self {
        Self {
            row: 0,
            column: 0,
            max_row: layout.max(Field::Row),
        }
    }
}

impl TraversalPolicy for RowMajor {
    fn kind(&self) -> TraversalKind {
        TraversalKind::RowMajor
    }

    fn cursor(&self) -> AccessCoordinate {
        AccessCoordinate::new(self.row, 0, 0, self.column)
    }

    fn advance(&mut self) {
        if self.row < self.max_row {
            self.row += 1;
        } else {
            self.row = 0;
            self.column = self.column.saturating_add(1);
            log::trace!("row major: moved to column {}", self.column);
        }
    }
}

/// Interleaves accesses over every bank of every bank group.
///
/// The combined bank index keeps the bank in its low `bank_bits` bits
/// and the bank group above them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRoundRobin {
    row: u64,
    column: u64,
    bank_index: u64,
    bank_bits: u32,
    max_bank: u64,
    max_bank_group: u64,
    max_bank_index: u64,
    max_column: u64,
}

impl BankRoundRobin {
    #[must_use]
    pub fn new(layout: &AddressLayout) -> Self {
        Self {
            row: 0,
            column: 0,
            bank_index: 0,
            bank_bits: layout.bits(Field::Bank),
            max_bank: layout.max(Field::Bank),
            max_bank_group: layout.max(Field::BankGroup),
            max_bank_index: layout.max_bank_index(),
            max_column: layout.max(Field::Column),
        }
    }

    #[must_use]
    pub fn bank_index(&self) -> u64 {
        self.bank_index
    }
}

impl TraversalPolicy for BankRoundRobin {
    fn kind(&self) -> TraversalKind {
        TraversalKind::BankRoundRobin
    }

    fn cursor(&self) -> AccessCoordinate {
        let bank_group = self
            .bank_index
            .checked_shr(self.bank_bits)
            .unwrap_or(0)
            & self.max_bank_group;
        let bank = self.bank_index & self.max_bank;
        AccessCoordinate::new(self.row, bank_group, bank, self.column)
    }

    fn advance(&mut self) {
        if self.bank_index < self.max_bank_index {
            self.bank_index += 1;
            return;
        }
        self.bank_index = 0;
        if self.column < self.max_column {
            self.column += 1;
        } else {
            self.column = 0;
            self.row = self.row.saturating_add(1);
            log::trace!("bank round robin: moved to row {}", self.row);
        }
    }
}

/// One of the traversal orders, chosen at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Traversal {
    ColumnMajor(ColumnMajor),
    RowMajor(RowMajor),
    BankRoundRobin(BankRoundRobin),
}

impl Traversal {
    #[must_use]
    pub fn new(kind: TraversalKind, layout: &AddressLayout) -> Self {
        match kind {
            TraversalKind::ColumnMajor => Self::ColumnMajor(ColumnMajor::new(layout)),
            TraversalKind::RowMajor => Self::RowMajor(RowMajor::new(layout)),
            TraversalKind::BankRoundRobin => Self::BankRoundRobin(BankRoundRobin::new(layout)),
        }
    }

    fn inner(&self) -> &dyn TraversalPolicy {
        match self {
            Self::ColumnMajor(policy) => policy,
            Self::RowMajor(policy) => policy,
            Self::BankRoundRobin(policy) => policy,
        }
    }
}

impl TraversalPolicy for Traversal {
    fn kind(&self) -> TraversalKind {
        self.inner().kind()
    }

    fn cursor(&self) -> AccessCoordinate {
        self.inner().cursor()
    }

    fn advance(&mut self) {
        match self {
            Self::ColumnMajor(policy) => policy.advance(),
            Self::RowMajor(policy) => policy.advance(),
            Self::BankRoundRobin(policy) => policy.advance(),
        }
    }
}

impl Iterator for Traversal {
    type Item = AccessCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_coordinate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

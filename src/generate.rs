//! Driving a traversal into a trace.

use crate::emitter::{EmitMode, FieldOverflow, Records, TraceEmitter};
use crate::layout::{AddressLayout, Field};
use crate::policy::{Traversal, TraversalKind, TraversalPolicy};
use crate::trace::TraceWriter;
use crate::{fs, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use trace_model::TraceRecord;

/// Everything needed to produce one trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub layout: AddressLayout,
    pub policy: TraversalKind,
    /// Number of coordinates to visit.
    pub steps: u64,
    /// Written as `write_then_read` or `{single: W}`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub mode: EmitMode,
    pub overflow: FieldOverflow,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            layout: AddressLayout::default(),
            policy: TraversalKind::ColumnMajor,
            steps: 0,
            mode: EmitMode::default(),
            overflow: FieldOverflow::default(),
        }
    }
}

impl GenerationRequest {
    #[must_use]
    pub fn new(policy: TraversalKind, steps: u64, mode: EmitMode) -> Self {
        Self {
            policy,
            steps,
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: AddressLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_overflow(mut self, overflow: FieldOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, Error> {
        let request = serde_yaml::from_reader(reader)?;
        Ok(request)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let reader = fs::open_readable(path)?;
        Self::from_reader(reader)
    }

    /// Number of steps before a field of the layout runs out of values.
    ///
    /// Row major sweeps run out of columns, the other traversals run out of rows.
    #[must_use]
    pub fn max_steps(&self) -> u128 {
        let mut bits = self.layout.bits(Field::Row) + self.layout.bits(Field::Column);
        if self.policy == TraversalKind::BankRoundRobin {
            bits += self.layout.bits(Field::Bank) + self.layout.bits(Field::BankGroup);
        }
        1u128 << bits
    }

    /// Fails with the error the first out of range step would raise.
    ///
    /// Always succeeds when overflowing fields bleed into their neighbours.
    pub fn check_capacity(&self) -> Result<(), Error> {
        if self.overflow == FieldOverflow::Bleed || u128::from(self.steps) <= self.max_steps() {
            return Ok(());
        }
        let field = match self.policy {
            TraversalKind::RowMajor => Field::Column,
            TraversalKind::ColumnMajor | TraversalKind::BankRoundRobin => Field::Row,
        };
        let max = self.layout.max(field);
        Err(Error::OutOfRange {
            field,
            value: max.saturating_add(1),
            max,
        })
    }

    /// Total number of records the request produces.
    #[must_use]
    pub fn num_records(&self) -> u64 {
        self.steps
            .saturating_mul(self.mode.records_per_step() as u64)
    }
}

/// Number of steps used for a trace of `size_bytes` bytes.
#[must_use]
pub fn num_steps_for_size(size_bytes: u64) -> u64 {
    size_bytes / 2
}

/// Lazily generates the records of a request.
///
/// Holds one traversal cursor and at most two pending records.
/// Generation stops after the first error.
#[derive(Debug)]
pub struct Generator {
    traversal: Traversal,
    emitter: TraceEmitter,
    remaining: u64,
    pending: smallvec::IntoIter<[TraceRecord; 2]>,
    failed: bool,
}

impl Generator {
    #[must_use]
    pub fn new(request: &GenerationRequest) -> Self {
        Self {
            traversal: Traversal::new(request.policy, &request.layout),
            emitter: TraceEmitter::new(request.layout, request.mode)
                .with_overflow(request.overflow),
            remaining: request.steps,
            pending: Records::new().into_iter(),
            failed: false,
        }
    }

    /// Number of steps not yet taken.
    #[must_use]
    pub fn remaining_steps(&self) -> u64 {
        self.remaining
    }
}

impl Iterator for Generator {
    type Item = Result<TraceRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.pending.next() {
            return Some(Ok(record));
        }
        if self.failed || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let coord = self.traversal.next_coordinate();
        match self.emitter.emit(&coord) {
            Ok(records) => {
                self.pending = records.into_iter();
                self.pending.next().map(Ok)
            }
            Err(err) => {
                log::debug!("stopping {} traversal at {coord}: {err}", self.traversal.kind());
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let pending = self.pending.len();
        if self.failed {
            return (pending, Some(pending));
        }
        let upcoming = self
            .remaining
            .checked_mul(self.emitter.mode().records_per_step() as u64)
            .and_then(|n| usize::try_from(n).ok())
            .and_then(|n| n.checked_add(pending));
        // an out of range step may cut the trace short
        (pending, upcoming)
    }
}

/// Summary of a written trace.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub steps: u64,
    pub records: u64,
}

/// Streams the trace for `request` into `out`.
///
/// Records are written as they are generated, nothing is buffered beyond `out` itself.
/// Requests with more steps than the layout can address are rejected before
/// anything is written.
pub fn generate(request: &GenerationRequest, out: impl std::io::Write) -> Result<Summary, Error> {
    log::debug!(
        "generating {} steps of {} traversal ({} mode, {:?} overflow)",
        request.steps,
        request.policy,
        request.mode,
        request.overflow,
    );
    request.check_capacity()?;
    let mut writer = TraceWriter::for_layout(&request.layout, out)?;
    for record in Generator::new(request) {
        writer.write(&record?)?;
    }
    let records = writer.finish()?;
    log::debug!("generated {records} records");
    Ok(Summary {
        steps: request.steps,
        records,
    })
}

/// Writes the trace for `request` to `path`.
///
/// The file is only created once the request is known to fit the layout.
/// An I/O error while writing can still leave a partial file behind.
pub fn write_trace_file(
    request: &GenerationRequest,
    path: impl AsRef<Path>,
) -> Result<Summary, Error> {
    let path = path.as_ref();
    request.check_capacity()?;
    TraceWriter::for_layout(&request.layout, std::io::sink())?;
    let out = fs::open_writable(path)?;
    let summary = generate(request, out)?;
    log::info!("written {}", path.display());
    Ok(summary)
}

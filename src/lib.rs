#![allow(
    non_camel_case_types,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]

//! Synthetic DRAM access traces.
//!
//! A [`GenerationRequest`] picks an [`AddressLayout`], a traversal order and an
//! emit mode. The [`Generator`] walks the address space in that order, packs every
//! `(row, bank_group, bank, column)` coordinate into an address and streams the
//! resulting records, which [`generate`] writes in the text format consumed by
//! DRAM simulators such as ramulator.

pub mod codec;
pub mod emitter;
pub mod error;
pub mod fs;
pub mod generate;
pub mod layout;
pub mod policy;
pub mod trace;

pub use emitter::{EmitMode, FieldOverflow, TraceEmitter};
pub use error::{Error, Result};
pub use generate::{generate, write_trace_file, GenerationRequest, Generator, Summary};
pub use layout::{AddressLayout, BitWidths, Field};
pub use policy::{Traversal, TraversalKind, TraversalPolicy};
pub use trace_model::{AccessCoordinate, Operation, TraceRecord};

pub type address = u64;

//! Core library for the affinity-combine command line application.
//!
//! The library exposes high-level orchestration helpers that power the
//! command-line interface as well as the integration tests. The modules are
//! structured to keep responsibilities narrow and composable: CSV adapters
//! live under [`io`], data representations inside [`model`], the outer join
//! and overlap classification in [`join`], the agreement-gated accumulation
//! in [`combine`], and provenance reporting in [`report`].

pub mod combine;
pub mod error;
pub mod io;
pub mod join;
pub mod model;
pub mod report;

pub use error::{CombineError, Result};

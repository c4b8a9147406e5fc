//! Output Generation
//!
//! World snapshots for renderers and run reports.

pub mod snapshot;

pub use snapshot::*;

//! Caller-side access to the latest draws with graceful degradation.
//!
//! [`ResultsClient`] tries the official feed directly, then each configured
//! intermediate service, and finally a local snapshot, so callers always get
//! a non-empty list.

pub mod client;
pub mod error;
pub mod payload;
pub mod snapshot;

pub use client::{ClientResults, ResultsClient, ResultsSource};
pub use error::ClientError;
pub use payload::{extract_results, payload_source};
pub use snapshot::{
    bundled_results, load_snapshot_results, update_snapshot, write_if_changed, SnapshotFile,
    SnapshotMetadata, UpdateOutcome, SNAPSHOT_FORMAT_VERSION,
};

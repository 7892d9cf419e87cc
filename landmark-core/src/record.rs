//! Records of training and evaluation metrics.
//!
//! A [`Record`] is a set of named values. Callbacks and the training loop
//! produce records and hand them to a [`Recorder`], which either writes them
//! right away ([`Recorder::write`]) or keeps them until the next
//! [`Recorder::flush`], where values stored under the same key are
//! aggregated by [`RecordStorage`].
//!
//! ```rust
//! use landmark_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("mean_score", 1.5);
//! record.insert("filename", RecordValue::String("case_01.nii.gz".to_string()));
//! assert_eq!(record.get_scalar("mean_score").unwrap(), 1.5);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;

/// Key of the optimization step count in records passed to recorders.
pub const STEP_KEY: &str = "opt_steps";

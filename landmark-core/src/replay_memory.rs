//! Replay memory with history-frame stacking.
//!
//! [`ReplayMemory`] is a ring buffer of [`Experience`]s backed by four
//! parallel arrays allocated once at construction. A training sample is a
//! window of `history_len + 1` consecutive transitions whose frames are
//! stacked on a trailing axis; frames belonging to a previous episode are
//! zeroed so that no history leaks across episode boundaries.
//!
//! ```rust
//! use landmark_core::replay_memory::{Experience, ReplayMemory, ReplayMemoryConfig};
//! use ndarray::ArrayD;
//!
//! let config = ReplayMemoryConfig::default()
//!     .capacity(100)
//!     .state_shape(vec![2, 2])
//!     .history_len(2);
//! let mut memory = ReplayMemory::build(&config).unwrap();
//!
//! for i in 0..4u8 {
//!     let state = ArrayD::from_elem(vec![2, 2], i);
//!     memory.append(Experience::new(state, 0, 1.0, false)).unwrap();
//! }
//!
//! let sample = memory.sample(0).unwrap();
//! assert_eq!(sample.state.shape(), &[2, 2, 3]);
//! ```
mod base;
mod batch;
mod config;
mod experience;
pub use base::{stack_frames, ReplayMemory};
pub use batch::{Sample, TransitionBatch};
pub use config::ReplayMemoryConfig;
pub use experience::Experience;

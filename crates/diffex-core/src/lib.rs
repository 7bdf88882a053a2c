//! Plain-text diff, fuzzy match and patch engine.
//!
//! - [`diff`] computes an edit script between two texts.
//! - [`cleanup`] reshapes scripts for readability or compactness.
//! - [`matcher`] finds a pattern near an expected location, tolerating errors.
//! - [`patch`] turns scripts into context-carrying patches and applies them
//!   to texts that may have drifted.
//!
//! All lengths and positions are counted in chars (Unicode scalar values).
//! Every operation is synchronous and takes an immutable [`Config`].

pub mod cleanup;
pub mod config;
pub mod deadline;
pub mod diff;
pub mod error;
pub mod escape;
pub mod matcher;
pub mod patch;
pub mod text;

pub use config::Config;
pub use deadline::{Clock, Deadline, ManualClock, SystemClock};
pub use diff::{DiffOp, DiffOpType, Diffs};
pub use error::{Error, Result};
pub use patch::{Patch, PatchInput};

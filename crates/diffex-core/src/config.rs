//! Engine tuning knobs.
//!
//! A [`Config`] is immutable for the duration of a call and is passed by
//! reference into every top-level operation. Partial JSON documents
//! deserialize thanks to `#[serde(default)]`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deadline::{Clock, Deadline};
use crate::error::{Error, Result};

/// Widest bitmask the match engine can drive.
pub const MAX_MATCH_BITS: usize = u128::BITS as usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds a top-level diff may spend bisecting; `0` means unlimited.
    pub diff_timeout: f64,
    /// Cost of an empty edit, in chars, for efficiency cleanup.
    pub diff_edit_cost: usize,
    /// `0.0` demands a perfect match, `1.0` accepts anything.
    pub match_threshold: f64,
    /// How far from the expected location a match may drift (in chars)
    /// before it costs a full error.
    pub match_distance: usize,
    /// How closely a large deletion must match before a patch applies.
    pub patch_delete_threshold: f64,
    /// Context chars kept around each patch.
    pub patch_margin: usize,
    /// Longest pattern the match engine accepts.
    pub match_max_bits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            diff_timeout: 1.0,
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
            match_max_bits: 32,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.diff_timeout.is_finite() || self.diff_timeout < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "diff_timeout must be finite and >= 0, got {}",
                self.diff_timeout
            )));
        }
        for (name, value) in [
            ("match_threshold", self.match_threshold),
            ("patch_delete_threshold", self.patch_delete_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.match_max_bits == 0 || self.match_max_bits > MAX_MATCH_BITS {
            return Err(Error::InvalidConfig(format!(
                "match_max_bits must be within 1..={MAX_MATCH_BITS}, got {}",
                self.match_max_bits
            )));
        }
        if self.patch_margin * 2 >= self.match_max_bits {
            return Err(Error::InvalidConfig(format!(
                "patch_margin ({}) must be smaller than half of match_max_bits ({})",
                self.patch_margin, self.match_max_bits
            )));
        }
        Ok(())
    }

    /// Deadline for one top-level diff, measured on `clock`.
    pub fn deadline<'c>(&self, clock: &'c dyn Clock) -> Deadline<'c> {
        if self.diff_timeout <= 0.0 {
            return Deadline::unbounded(clock);
        }
        match Duration::try_from_secs_f64(self.diff_timeout) {
            Ok(timeout) => Deadline::after(timeout, clock),
            Err(_) => Deadline::unbounded(clock),
        }
    }
}

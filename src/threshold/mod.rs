// src/threshold/mod.rs
//! Threshold monitoring for simulated traffic shaping
//!
//! Every label except the unknown IPv4 class has a positive threshold. After
//! each increment the monitor compares the new count against it and produces
//! a [`ShapingSignal`] whenever the count is strictly greater.
//!
//! The check is level-triggered: once a label is past its threshold, every
//! further packet of that label produces a signal again. Nothing is enforced;
//! the signal only reports that shaping would have kicked in.

use crate::classifier::ClassLabel;
use crate::utils::config::ThresholdsConfig;
use crate::utils::errors::{EngineError, Result};
use serde::Serialize;

/// Fixed per-label thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdTable {
    limits: [Option<u64>; ClassLabel::COUNT],
}

impl ThresholdTable {
    /// Built-in thresholds: A 15, B 10, C 7, IPv6 5, unknown IPv4 none
    pub const fn standard() -> Self {
        // Indexed in ClassLabel::ALL order
        Self {
            limits: [Some(15), Some(10), Some(7), None, Some(5)],
        }
    }

    /// Build from configuration, rejecting non-positive values
    pub fn from_config(config: &ThresholdsConfig) -> Result<Self> {
        let mut limits = [None; ClassLabel::COUNT];
        for (label, threshold) in config.entries() {
            if threshold == 0 {
                return Err(EngineError::InvalidThreshold {
                    label: label.to_string(),
                    reason: "threshold must be positive".to_string(),
                });
            }
            limits[label.index()] = Some(threshold);
        }
        Ok(Self { limits })
    }

    /// Threshold for `label`, `None` if the label never shapes
    #[inline]
    pub fn get(&self, label: ClassLabel) -> Option<u64> {
        self.limits[label.index()]
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Notification that a label's count is past its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShapingSignal {
    pub label: ClassLabel,

    /// Post-increment count that triggered the signal
    pub count: u64,

    pub threshold: u64,
}

/// Compares post-increment counts against the threshold table
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdMonitor {
    table: ThresholdTable,
}

impl ThresholdMonitor {
    pub fn new(table: ThresholdTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Signal if `count` is strictly above the threshold for `label`
    #[inline]
    pub fn check(&self, label: ClassLabel, count: u64) -> Option<ShapingSignal> {
        let threshold = self.table.get(label)?;
        (count > threshold).then_some(ShapingSignal {
            label,
            count,
            threshold,
        })
    }
}

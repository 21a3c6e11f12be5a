// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Validation errors shared by every configuration type in the workspace.

use std::fmt::{self, Display};

/// An error produced while validating or loading controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The complexity factor weights do not add up to 1.0.
    WeightsDoNotSumToOne {
        /// The actual sum of the configured weights.
        sum: f32,
    },
    /// A complexity factor weight is negative.
    NegativeWeight {
        /// Name of the offending factor.
        factor: &'static str,
        /// The configured value.
        value: f32,
    },
    /// A numeric option lies outside of its documented range.
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The configured value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// A set of thresholds is not strictly ordered.
    UnorderedThresholds(String),
    /// The configuration document could not be parsed.
    Parse(String),
}

impl ConfigError {
    /// Checks `value` against an inclusive range, producing [`ConfigError::OutOfRange`].
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if value.is_nan() || value < min || value > max {
            Err(ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            })
        } else {
            Ok(())
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::WeightsDoNotSumToOne { sum } => {
                write!(f, "Complexity weights must sum to 1.0 (got {sum:.4})")
            }
            ConfigError::NegativeWeight { factor, value } => {
                write!(f, "Complexity weight '{factor}' is negative ({value})")
            }
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "'{field}' = {value} is outside of [{min}, {max}]"),
            ConfigError::UnorderedThresholds(msg) => write!(f, "Unordered thresholds: {msg}"),
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

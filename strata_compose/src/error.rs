// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition errors.

extern crate alloc;

use alloc::string::String;
use core::fmt;

use crate::dependency::DependencyError;
use crate::layer::UnknownMark;

/// A fatal configuration error. The pass that raised it leaves the registry unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposeError {
    /// The factory has no layer type for a mark.
    UnknownMark(UnknownMark),
    /// The factory returned the wrong number of instances for a definition.
    InstanceCountMismatch {
        /// Display form of the definition's identity.
        identity: String,
        /// Number of configs in the definition.
        expected: usize,
        /// Number of instances returned.
        actual: usize,
    },
    /// The pass's dependency declarations are invalid.
    Dependency(DependencyError),
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMark(e) => e.fmt(f),
            Self::InstanceCountMismatch {
                identity,
                expected,
                actual,
            } => write!(
                f,
                "layer factory returned {actual} instances for `{identity}`, expected {expected}"
            ),
            Self::Dependency(e) => e.fmt(f),
        }
    }
}

impl core::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::UnknownMark(e) => Some(e),
            Self::InstanceCountMismatch { .. } => None,
            Self::Dependency(e) => Some(e),
        }
    }
}

impl From<UnknownMark> for ComposeError {
    fn from(e: UnknownMark) -> Self {
        Self::UnknownMark(e)
    }
}

impl From<DependencyError> for ComposeError {
    fn from(e: DependencyError) -> Self {
        Self::Dependency(e)
    }
}

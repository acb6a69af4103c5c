// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition diagnostics.
//!
//! Composition never logs on its own. Instead it reports what it did through a [`TraceSink`]
//! wrapped in a [`Tracer`]. With the `trace` feature off every [`Tracer`] method compiles to
//! nothing, so callers can pass [`Tracer::none`] everywhere without cost.

use crate::axis::Side;
use crate::layer::LayerIdentity;
use crate::registry::LayerKey;

/// A layer instance changed state during a composition pass.
#[derive(Clone, Copy, Debug)]
pub struct LayerEvent<'a> {
    /// Registry key of the instance.
    pub key: LayerKey,
    /// Alias of the instance at the time of the event.
    pub alias: &'a str,
    /// Identity the instance belongs to.
    pub identity: &'a LayerIdentity,
}

/// Why a domain contribution was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The layer encodes nothing on the side.
    MissingEncoding,
    /// The encoded field is not in the fields config.
    UnknownField,
    /// The layer's axis slot selects no field group.
    UnmatchedAxis,
}

/// A layer's domain for one side did not take part in the shared domain.
#[derive(Clone, Copy, Debug)]
pub struct SkippedContribution<'a> {
    /// The contributing layer.
    pub key: LayerKey,
    /// The side whose domain was dropped.
    pub side: Side,
    /// The encoded field, when there is one.
    pub field: Option<&'a str>,
    /// Why it was dropped.
    pub reason: SkipReason,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives composition events.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// A new instance was created and configured.
    fn on_layer_created(&mut self, e: &LayerEvent<'_>) {
        _ = e;
    }

    /// An existing instance was reconfigured in place.
    fn on_layer_reused(&mut self, e: &LayerEvent<'_>) {
        _ = e;
    }

    /// An instance was released.
    fn on_layer_released(&mut self, e: &LayerEvent<'_>) {
        _ = e;
    }

    /// The initialization order of a pass was resolved.
    fn on_init_order(&mut self, aliases: &[&str]) {
        _ = aliases;
    }

    /// A domain contribution was skipped.
    fn on_contribution_skipped(&mut self, e: &SkippedContribution<'_>) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a created [`LayerEvent`].
    #[inline]
    pub fn layer_created(&mut self, e: &LayerEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer_created(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a reused [`LayerEvent`].
    #[inline]
    pub fn layer_reused(&mut self, e: &LayerEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer_reused(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a released [`LayerEvent`].
    #[inline]
    pub fn layer_released(&mut self, e: &LayerEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer_released(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits the resolved initialization order.
    #[inline]
    pub fn init_order(&mut self, aliases: &[&str]) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_init_order(aliases);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = aliases;
        }
    }

    /// Emits a [`SkippedContribution`].
    #[inline]
    pub fn contribution_skipped(&mut self, e: &SkippedContribution<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_contribution_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    extern crate std;

    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        orders: Vec<Vec<String>>,
        skipped: Vec<SkipReason>,
    }

    impl TraceSink for Recorder {
        fn on_init_order(&mut self, aliases: &[&str]) {
            self.orders
                .push(aliases.iter().map(|a| a.to_string()).collect());
        }

        fn on_contribution_skipped(&mut self, e: &SkippedContribution<'_>) {
            self.skipped.push(e.reason);
        }
    }

    #[test]
    fn tracer_dispatches_to_sink() {
        let mut rec = Recorder::default();
        {
            let mut tracer = Tracer::new(&mut rec);
            tracer.init_order(&["a", "b"]);
            tracer.contribution_skipped(&SkippedContribution {
                key: LayerKey::new(0, 0),
                side: Side::X,
                field: None,
                reason: SkipReason::MissingEncoding,
            });
        }
        assert_eq!(rec.orders, [["a".to_string(), "b".to_string()]]);
        assert_eq!(rec.skipped, [SkipReason::MissingEncoding]);
    }

    #[test]
    fn none_tracer_is_silent() {
        let mut tracer = Tracer::none();
        tracer.init_order(&["a"]);
    }
}

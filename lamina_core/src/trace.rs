// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for cache builds.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`SceneGraphCache::build_traced`](crate::cache::SceneGraphCache::build_traced)
//! calls as it works through the dirty roots. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`ContextEvent`] and the
//!   corresponding `TraceSink` method.

use crate::cache::BuildStats;
use crate::collect::Patch;
use crate::node::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which kind of collection handled a dirty root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectKind {
    /// The root's own commands were re-emitted in place.
    Commands,
    /// The root's composed subtree was walked and its slice replaced.
    Subtree,
    /// A whole render context was rebuilt.
    Context,
}

/// Why a dirty root was not collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The node was destroyed after it was marked.
    Stale,
    /// The node is disconnected or under a hidden ancestor.
    NotRendered,
    /// The node's context was already rebuilt earlier in the same build.
    ContextRebuilt,
    /// A commands-only change on a hidden node.
    Hidden,
}

/// What happened to a render context.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextChange {
    /// The context was rebuilt from its viewport.
    Rebuilt,
    /// The context was dropped because its viewport is no longer rendered.
    Pruned,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once the dirty roots of a build are known and ordered.
#[derive(Clone, Copy, Debug)]
pub struct BuildBeginEvent {
    /// Monotonic build counter.
    pub build_index: u64,
    /// Number of dirty roots to process.
    pub roots: u32,
    /// Number of render contexts before the build.
    pub contexts: u32,
    /// Whether the root set overflowed and was collapsed to the cache root.
    pub collapsed: bool,
}

/// Emitted after each collection.
#[derive(Clone, Copy, Debug)]
pub struct CollectEvent {
    /// Build counter.
    pub build_index: u64,
    /// The collected node (the viewport for context rebuilds).
    pub node: NodeId,
    /// The viewport whose context was written.
    pub context: NodeId,
    /// Which kind of collection ran.
    pub kind: CollectKind,
    /// The length change propagated past the node. Empty for context rebuilds.
    pub patch: Patch,
}

/// Emitted for a dirty root that was dropped without collecting.
#[derive(Clone, Copy, Debug)]
pub struct SkipEvent {
    /// Build counter.
    pub build_index: u64,
    /// The dropped root.
    pub node: NodeId,
    /// Why it was dropped.
    pub reason: SkipReason,
}

/// Emitted at the end of every build.
#[derive(Clone, Copy, Debug)]
pub struct BuildEndEvent {
    /// Build counter.
    pub build_index: u64,
    /// What the build did.
    pub stats: BuildStats,
}

/// A render context change (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct ContextEvent {
    /// Build counter.
    pub build_index: u64,
    /// The viewport owning the context.
    pub viewport: NodeId,
    /// What happened.
    pub change: ContextChange,
    /// Flat-array length afterwards (0 when pruned).
    pub nodes: u32,
    /// Color buffer length afterwards.
    pub color: u32,
    /// Encode buffer length afterwards.
    pub encode: u32,
    /// Spatial buffer length afterwards.
    pub spatial: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from cache builds.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called once the roots of a build are ordered.
    fn on_build_begin(&mut self, e: &BuildBeginEvent) {
        _ = e;
    }

    /// Called after each collection.
    fn on_collect(&mut self, e: &CollectEvent) {
        _ = e;
    }

    /// Called for each dirty root that is dropped.
    fn on_skip(&mut self, e: &SkipEvent) {
        _ = e;
    }

    /// Called at the end of a build.
    fn on_build_end(&mut self, e: &BuildEndEvent) {
        _ = e;
    }

    /// Called when a context is rebuilt or pruned (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_context(&mut self, e: &ContextEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
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
    /// Creates a tracer that dispatches to the given sink.
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

    /// Emits a [`BuildBeginEvent`].
    #[inline]
    pub fn build_begin(&mut self, e: &BuildBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_build_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CollectEvent`].
    #[inline]
    pub fn collect(&mut self, e: &CollectEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_collect(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SkipEvent`].
    #[inline]
    pub fn skip(&mut self, e: &SkipEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_skip(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BuildEndEvent`].
    #[inline]
    pub fn build_end(&mut self, e: &BuildEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_build_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ContextEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn context(&mut self, e: &ContextEvent) {
        if let Some(s) = &mut self.sink {
            s.on_context(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::Delta;
    use crate::node::Dimension;

    const NODE: NodeId = NodeId {
        idx: 2,
        generation: 0,
    };

    fn sample_collect() -> CollectEvent {
        CollectEvent {
            build_index: 3,
            node: NODE,
            context: NODE,
            kind: CollectKind::Subtree,
            patch: Patch {
                index: 4,
                nodes: 1,
                commands: Delta {
                    color: 2,
                    encode: 0,
                },
                dimension: Dimension::Flat,
            },
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_build_begin(&BuildBeginEvent {
            build_index: 0,
            roots: 2,
            contexts: 1,
            collapsed: false,
        });
        sink.on_collect(&sample_collect());
        sink.on_build_end(&BuildEndEvent {
            build_index: 0,
            stats: BuildStats::default(),
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.collect(&sample_collect());
        tracer.skip(&SkipEvent {
            build_index: 1,
            node: NODE,
            reason: SkipReason::Stale,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            kinds: Vec<CollectKind>,
        }
        impl TraceSink for RecordingSink {
            fn on_collect(&mut self, e: &CollectEvent) {
                self.kinds.push(e.kind);
            }
        }

        let mut sink = RecordingSink { kinds: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.collect(&sample_collect());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.kinds, &[CollectKind::Subtree]);
    }
}

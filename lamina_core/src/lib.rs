// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental flat-array and command-buffer reconciliation for retained
//! scene graphs.
//!
//! `lamina_core` keeps a pre-order *flat array* of renderable nodes and the
//! command buffers they draw into in step with a mutable scene tree. After a
//! mutation only the affected slices are re-collected and spliced in place;
//! every other node's stored ranges are shifted by the length change. It is
//! `no_std` compatible (with `alloc`) and uses struct-of-arrays storage with
//! index handles.
//!
//! # Architecture
//!
//! ```text
//!   SceneTree mutations ──► dirty marks (SUBTREE / COMMANDS)
//!                                 │
//!                                 ▼
//!   SceneGraphCache::build() ──► dirty roots, sorted by tree order
//!                                 │
//!                                 ▼
//!   Collector ──► BoundaryContext ──► CommandBuffer::replace_range()
//!                                 │
//!                                 ▼
//!   Patch ──► ancestors and later entries shifted
//! ```
//!
//! **[`range`]**: the range algebra (`ShortRange`, `Segment`, `Variant`,
//! `CommandRange`). All operations are total; out-of-range input is clamped.
//!
//! **[`command`]**: the [`Command`](command::Command) and
//! [`CommandBuffer`](command::CommandBuffer) contracts a backend implements.
//!
//! **[`node`]**: the [`SceneTree`](node::SceneTree) arena with generational
//! handles, shadow roots and slots, and the composed [`Walk`](node::Walk).
//!
//! **[`dirty`]**: dirty channels for `understory_dirty` and the per-root
//! [`DirtState`](dirty::DirtState).
//!
//! **[`collect`]**: 2D and 3D collection and the [`Patch`](collect::Patch)
//! that propagates a length change.
//!
//! **[`cache`]**: [`SceneGraphCache`](cache::SceneGraphCache), which owns the
//! render contexts and turns dirty marks into collections.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! build instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! **[`verify`]**: from-scratch recomputation for tests and debugging.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-context
//!   rebuild and prune events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod cache;
pub mod collect;
pub mod command;
pub mod dirty;
pub mod node;
pub mod range;
pub mod trace;
pub mod verify;

// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree data model.
//!
//! A *node* is an element of an ordered tree. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - A [`NodeKind`] fixed at creation. Viewports, scenes and visuals are
//!   *renderables* and occupy a slot in a render context's flat array. Groups
//!   and slots are transparent.
//! - Literal topology (parent, children, siblings) plus an optional shadow
//!   root. What collection sees is the *composed* tree; see
//!   [`composed_parent`](SceneTree::composed_parent).
//! - Caller-set properties: visibility and 2D or 3D draw commands.
//! - Placement written by the last build: the node's flat-array span and its
//!   command spans.
//!
//! # Dirty tracking
//!
//! Mutations mark the affected node in a [`dirty`](crate::dirty) channel:
//!
//! - **SUBTREE**: on the parent for child list edits, on the host for shadow
//!   edits, and on the node itself for visibility changes.
//! - **COMMANDS**: on the node whose commands were replaced.
//!
//! Sealed nodes reject every mutation.

mod compose;
mod id;
mod store;
mod walk;

pub use id::{Dimension, INVALID, NodeId, NodeKind};
pub use store::SceneTree;
pub use walk::{Children, Visit, Walk};

pub(crate) use store::{Placement, Topology};

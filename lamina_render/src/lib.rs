// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Concrete draw commands for [`lamina_core`] command buffers.
//!
//! The core only asks a command which channels it writes. This crate gives
//! backends a ready-made vocabulary:
//!
//! - [`DrawOp`]: 2D fills, strokes, clip brackets and hit regions
//! - [`ClipShape`]: the shapes a [`DrawOp::PushClip`] can clip to
//! - [`MeshDraw`]: a 3D draw of a mesh with a material
//! - [`ResourceKey`]: opaque handle for backend-managed meshes and materials
//!
//! ```
//! use lamina_core::cache::SceneGraphCache;
//! use lamina_core::node::{NodeKind, SceneTree};
//! use lamina_render::{ClipShape, DrawOp, MeshDraw};
//! use kurbo::Rect;
//!
//! let mut tree = SceneTree::<DrawOp, MeshDraw>::new();
//! let window = tree.create_node(NodeKind::Viewport);
//! let scene = tree.create_node(NodeKind::Scene2d);
//! let panel = tree.create_node(NodeKind::Visual);
//! tree.append_child(window, scene);
//! tree.append_child(scene, panel);
//!
//! let area = Rect::new(0.0, 0.0, 100.0, 40.0);
//! let draw = DrawOp::bracket(
//!     ClipShape::Rect(area),
//!     [DrawOp::fill(area, [1.0, 1.0, 1.0, 1.0]), DrawOp::hit(area, 7)],
//! );
//! tree.set_commands_2d(panel, draw.pre, draw.post);
//!
//! let mut cache = SceneGraphCache::<Vec<DrawOp>, Vec<MeshDraw>>::new(&tree, window);
//! cache.build(&mut tree);
//! let ctx = cache.root_context().unwrap();
//! assert_eq!(ctx.color().len(), 3);
//! assert_eq!(ctx.encode().len(), 3);
//! ```

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod clip;
mod draw;
mod mesh;

pub use clip::ClipShape;
pub use draw::{Color, DrawOp, hit_ids};
pub use mesh::{MeshDraw, ResourceKey};

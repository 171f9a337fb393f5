// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON snapshots of render contexts.
//!
//! [`context`] describes one context: every flat-array entry with its stored
//! subtree and command ranges, plus buffer lengths. [`cache`] collects the
//! snapshots of all contexts of a cache, keyed by viewport. Commands
//! themselves are not serialized; a snapshot only records where they are.

use std::io::{self, Write};

use serde_json::{Map, Value, json};

use lamina_core::cache::{RenderContext, SceneGraphCache};
use lamina_core::command::CommandBuffer;
use lamina_core::node::{Dimension, NodeKind, SceneTree};
use lamina_core::range::Variant;

use crate::pretty::Short;

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Group => "group",
        NodeKind::Slot => "slot",
        NodeKind::Viewport => "viewport",
        NodeKind::Scene2d => "scene2d",
        NodeKind::Scene3d => "scene3d",
        NodeKind::Visual => "visual",
    }
}

fn variant(v: Variant) -> Value {
    json!([v.pre.start, v.pre.end, v.post.start, v.post.end])
}

/// Describes one render context.
///
/// 3D entries carry a single `spatial` range; 2D entries carry `color` and
/// `encode`.
pub fn context<C2, C3, B2, B3>(tree: &SceneTree<C2, C3>, ctx: &RenderContext<B2, B3>) -> Value
where
    B2: CommandBuffer,
    B3: CommandBuffer,
{
    let nodes: Vec<Value> = ctx
        .nodes()
        .iter()
        .map(|&id| {
            if !tree.is_alive(id) {
                return json!({ "id": Short(id).to_string(), "stale": true });
            }
            let subtree = tree.subtree_range(id);
            let commands = tree.command_range(id);
            let mut entry = Map::new();
            entry.insert("id".into(), Short(id).to_string().into());
            entry.insert("kind".into(), kind_name(tree.kind(id)).into());
            entry.insert("subtree".into(), json!([subtree.start, subtree.end]));
            match tree.dimension(id) {
                Dimension::Flat => {
                    entry.insert("color".into(), variant(commands.color));
                    entry.insert("encode".into(), variant(commands.encode));
                }
                Dimension::Spatial => {
                    entry.insert("spatial".into(), variant(commands.color));
                }
            }
            if !tree.is_visible(id) {
                entry.insert("hidden".into(), true.into());
            }
            Value::Object(entry)
        })
        .collect();
    json!({
        "nodes": nodes,
        "buffers": {
            "color": ctx.color().len(),
            "encode": ctx.encode().len(),
            "spatial": ctx.spatial().len(),
        },
    })
}

/// Describes every context of `cache`, keyed by viewport.
pub fn cache<C2, C3, B2, B3>(tree: &SceneTree<C2, C3>, cache: &SceneGraphCache<B2, B3>) -> Value
where
    B2: CommandBuffer,
    B3: CommandBuffer,
{
    let contexts: Map<String, Value> = cache
        .contexts()
        .map(|(viewport, ctx)| (Short(viewport).to_string(), context(tree, ctx)))
        .collect();
    json!({
        "root": Short(cache.root()).to_string(),
        "contexts": contexts,
    })
}

/// Writes `snapshot` as indented JSON followed by a newline.
pub fn write(snapshot: &Value, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, snapshot)?;
    writeln!(writer)
}

// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 3D mesh draws.

use core::fmt;

use lamina_core::command::Command;

/// An opaque handle to a backend-managed mesh, material or texture.
///
/// Keys are assigned by the backend and never interpreted here.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Draws one instance of a mesh with a material.
///
/// 3D scenes have a single output buffer, so the channel mask of a mesh draw
/// is never consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshDraw {
    /// Geometry to draw.
    pub mesh: ResourceKey,
    /// Material bound for the draw.
    pub material: ResourceKey,
    /// Instance index into the backend's per-instance data.
    pub instance: u32,
}

impl MeshDraw {
    /// A draw of instance 0.
    #[must_use]
    pub const fn new(mesh: ResourceKey, material: ResourceKey) -> Self {
        Self {
            mesh,
            material,
            instance: 0,
        }
    }

    /// Returns a copy drawing `instance`.
    #[must_use]
    pub const fn with_instance(mut self, instance: u32) -> Self {
        self.instance = instance;
        self
    }
}

impl Command for MeshDraw {}

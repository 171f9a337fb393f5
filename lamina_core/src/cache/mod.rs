// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene-graph cache: render contexts and incremental builds.
//!
//! A [`SceneGraphCache`] owns one [`RenderContext`] per connected, visible
//! viewport under its root. A context holds the pre-order flat array of the
//! renderables the viewport places and the command buffers they draw into.
//!
//! # Build
//!
//! [`build`](SceneGraphCache::build) turns the tree's dirty marks into the
//! smallest set of collections that brings every context up to date:
//!
//! 1. Both dirty channels are drained. Each mark is resolved to the nearest
//!    renderable at or above the marked node and fed to
//!    [`invalidated_subtree`](SceneGraphCache::invalidated_subtree), which
//!    merges it into the set of *dirty roots*.
//! 2. The roots are sorted by composed tree order. Each collection leaves
//!    behind positions that the following ones read, so later roots must
//!    come later in the flat array.
//! 3. Each root is collected: a viewport root rebuilds its context, a
//!    structural root re-walks its subtree, a commands-only root splices its
//!    own spans in place. Viewports reached by a subtree walk have their
//!    contexts rebuilt right after.
//! 4. Contexts of viewports that are no longer rendered are dropped.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::collect::{Collector, Patch, Scratch, to_pos};
use crate::command::CommandBuffer;
use crate::dirty::{self, DirtState};
use crate::node::{INVALID, NodeId, NodeKind, SceneTree, Topology};
use crate::trace::{
    BuildBeginEvent, BuildEndEvent, CollectEvent, CollectKind, SkipEvent, SkipReason, Tracer,
};


/// The output of one viewport: its flat array and command buffers.
///
/// `B2` backs the two 2D channels (color and encode) and `B3` the 3D buffer.
#[derive(Debug)]
pub struct RenderContext<B2, B3> {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) color: B2,
    pub(crate) encode: B2,
    pub(crate) spatial: B3,
}

impl<B2: Default, B3: Default> Default for RenderContext<B2, B3> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            color: B2::default(),
            encode: B2::default(),
            spatial: B3::default(),
        }
    }
}

impl<B2, B3> RenderContext<B2, B3> {
    /// The renderables placed by this context, in composed pre-order.
    ///
    /// The viewport itself is not included.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The 2D color buffer.
    #[inline]
    #[must_use]
    pub fn color(&self) -> &B2 {
        &self.color
    }

    /// The 2D encode buffer.
    #[inline]
    #[must_use]
    pub fn encode(&self) -> &B2 {
        &self.encode
    }

    /// The 3D buffer.
    #[inline]
    #[must_use]
    pub fn spatial(&self) -> &B3 {
        &self.spatial
    }
}

/// Tuning for a [`SceneGraphCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Once more dirty roots than this are pending, a build rebuilds the
    /// root context instead of collecting each root.
    pub max_dirty_roots: usize,
}

impl CacheConfig {
    /// The default bound on pending dirty roots.
    pub const DEFAULT_MAX_DIRTY_ROOTS: usize = 64;

    /// Creates the default configuration.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_dirty_roots: Self::DEFAULT_MAX_DIRTY_ROOTS,
        }
    }

    /// Sets [`max_dirty_roots`](Self::max_dirty_roots).
    #[inline]
    #[must_use]
    pub const fn with_max_dirty_roots(mut self, max: usize) -> Self {
        self.max_dirty_roots = max;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What a build did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BuildStats {
    /// Dirty roots processed.
    pub roots: u32,
    /// Buffer splices performed, flat array included.
    pub splices: u32,
    /// Collections run, context rebuilds included.
    pub collected: u32,
}

/// A pending unit of work: a renderable and what changed below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DirtyRoot {
    /// The renderable to collect.
    pub node: NodeId,
    /// What changed.
    pub state: DirtState,
}

/// Incremental flat arrays and command buffers for one window.
///
/// The cache is owned by the caller and tied to the root viewport it was
/// created with. Any number of caches may read the same tree, but each build
/// drains the tree's dirty marks, so only one cache per tree sees them.
pub struct SceneGraphCache<B2: CommandBuffer, B3: CommandBuffer> {
    root: NodeId,
    config: CacheConfig,
    contexts: BTreeMap<NodeId, RenderContext<B2, B3>>,
    roots: Vec<DirtyRoot>,
    scratch: Scratch<B2::Command, B3::Command>,
    stamp: u32,
    builds: u64,
}

impl<B2: CommandBuffer, B3: CommandBuffer> fmt::Debug for SceneGraphCache<B2, B3> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraphCache")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("contexts", &self.contexts.len())
            .field("roots", &self.roots)
            .field("builds", &self.builds)
            .finish_non_exhaustive()
    }
}

impl<B2: CommandBuffer, B3: CommandBuffer> SceneGraphCache<B2, B3> {
    /// Creates an empty cache for the window rooted at `root`.
    ///
    /// Nothing is collected until the first [`build`](Self::build).
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale or not a [`Viewport`](NodeKind::Viewport).
    #[must_use]
    pub fn new<C2, C3>(tree: &SceneTree<C2, C3>, root: NodeId) -> Self {
        Self::with_config(tree, root, CacheConfig::default())
    }

    /// Creates an empty cache with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale or not a [`Viewport`](NodeKind::Viewport).
    #[must_use]
    pub fn with_config<C2, C3>(tree: &SceneTree<C2, C3>, root: NodeId, config: CacheConfig) -> Self {
        assert!(
            tree.kind(root) == NodeKind::Viewport,
            "cache root must be a viewport"
        );
        Self {
            root,
            config,
            contexts: BTreeMap::new(),
            roots: Vec::new(),
            scratch: Scratch::default(),
            stamp: 0,
            builds: 0,
        }
    }

    /// The root viewport.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Replaces the configuration. Takes effect at the next build.
    pub fn set_config(&mut self, config: CacheConfig) {
        self.config = config;
    }

    /// The context of the root viewport, once built.
    #[inline]
    #[must_use]
    pub fn root_context(&self) -> Option<&RenderContext<B2, B3>> {
        self.contexts.get(&self.root)
    }

    /// The context of `viewport`, if it is rendered and has been built.
    #[inline]
    #[must_use]
    pub fn context(&self, viewport: NodeId) -> Option<&RenderContext<B2, B3>> {
        self.contexts.get(&viewport)
    }

    /// All built contexts, keyed by viewport.
    pub fn contexts(&self) -> impl Iterator<Item = (NodeId, &RenderContext<B2, B3>)> + '_ {
        self.contexts.iter().map(|(&id, ctx)| (id, ctx))
    }

    /// Dirty roots waiting for the next build.
    #[inline]
    #[must_use]
    pub fn dirty_roots(&self) -> &[DirtyRoot] {
        &self.roots
    }

    /// Records that `node` needs collecting.
    ///
    /// The node is resolved to the nearest renderable at or above it in the
    /// composed tree. The request is then merged into the pending roots:
    ///
    /// - A root already covering the node (the same node, or a structural
    ///   root above it) absorbs the request.
    /// - A structural request replaces the pending roots below it.
    /// - Anything else becomes a new root.
    ///
    /// Requests for stale or disconnected nodes are ignored, as are
    /// commands-only requests on non-renderables.
    pub fn invalidated_subtree<C2, C3>(
        &mut self,
        tree: &SceneTree<C2, C3>,
        node: NodeId,
        state: DirtState,
    ) {
        if state.is_empty() || !tree.is_alive(node) {
            return;
        }
        let topo = &tree.topo;
        if state.is_commands_only() && !topo.kind[node.idx as usize].is_renderable() {
            return;
        }
        let idx = topo.nearest_renderable(node.idx);
        if idx == INVALID || (idx != self.root.idx && !topo.is_composed_ancestor(self.root.idx, idx))
        {
            return;
        }
        insert_root(&mut self.roots, topo, topo.id(idx), state);
    }

    /// Brings every context up to date with the tree.
    ///
    /// With no dirty marks pending this performs no splices.
    ///
    /// # Panics
    ///
    /// Panics if the root viewport was destroyed, or if a collection reaches
    /// a scene of the other dimension without crossing a viewport.
    pub fn build(&mut self, tree: &mut SceneTree<B2::Command, B3::Command>) -> BuildStats
    where
        B2: Default,
        B3: Default,
    {
        self.build_traced(tree, &mut Tracer::none())
    }

    /// Like [`build`](Self::build), reporting each step to `tracer`.
    ///
    /// # Panics
    ///
    /// See [`build`](Self::build).
    pub fn build_traced(
        &mut self,
        tree: &mut SceneTree<B2::Command, B3::Command>,
        tracer: &mut Tracer<'_>,
    ) -> BuildStats
    where
        B2: Default,
        B3: Default,
    {
        assert!(tree.is_alive(self.root), "cache root was destroyed");
        self.builds += 1;
        let build_index = self.builds;

        for idx in tree.take_dirty(dirty::SUBTREE) {
            let id = tree.topo.id(idx);
            self.invalidated_subtree(&*tree, id, DirtState::SUBTREE);
        }
        for idx in tree.take_dirty(dirty::COMMANDS) {
            let id = tree.topo.id(idx);
            self.invalidated_subtree(&*tree, id, DirtState::COMMANDS);
        }
        if !self.contexts.contains_key(&self.root) {
            insert_root(&mut self.roots, &tree.topo, self.root, DirtState::SUBTREE);
        }

        let collapsed = self.roots.len() > self.config.max_dirty_roots;
        if collapsed {
            self.roots.clear();
            self.roots.push(DirtyRoot {
                node: self.root,
                state: DirtState::SUBTREE,
            });
        }

        let mut roots = core::mem::take(&mut self.roots);
        roots.retain(|root| {
            let current = tree.topo.is_current(root.node);
            if !current {
                tracer.skip(&SkipEvent {
                    build_index,
                    node: root.node,
                    reason: SkipReason::Stale,
                });
            }
            current
        });
        roots.sort_by_cached_key(|root| tree.topo.tree_order_key(root.node.idx));

        tracer.build_begin(&BuildBeginEvent {
            build_index,
            roots: to_pos(roots.len()),
            contexts: to_pos(self.contexts.len()),
            collapsed,
        });

        let root = self.root;
        let mut pass = BuildPass {
            collector: Collector::new(tree.parts(), &mut self.scratch, &mut self.stamp),
            contexts: &mut self.contexts,
            rebuilt: Vec::new(),
            stats: BuildStats {
                roots: to_pos(roots.len()),
                ..BuildStats::default()
            },
            tracer: &mut *tracer,
            build_index,
            root: root.idx,
        };
        for dirty_root in &roots {
            pass.process(*dirty_root);
            pass.drain_nested();
        }
        let mut stats = pass.stats;
        stats.splices = pass.collector.splices;

        self.prune(&tree.topo, build_index, tracer);
        roots.clear();
        self.roots = roots;

        tracer.build_end(&BuildEndEvent { build_index, stats });
        stats
    }

    /// Drops the contexts of viewports that are no longer rendered.
    fn prune(&mut self, topo: &Topology, build_index: u64, tracer: &mut Tracer<'_>) {
        let root = self.root;
        let dead: Vec<NodeId> = self
            .contexts
            .keys()
            .copied()
            .filter(|&id| {
                if id == root {
                    return false;
                }
                let i = id.idx as usize;
                !(topo.is_current(id)
                    && topo.kind[i] == NodeKind::Viewport
                    && topo.visible[i]
                    && topo.is_rendered(id.idx, root.idx))
            })
            .collect();
        for id in dead {
            self.contexts.remove(&id);
            #[cfg(feature = "trace-rich")]
            tracer.context(&crate::trace::ContextEvent {
                build_index,
                viewport: id,
                change: crate::trace::ContextChange::Pruned,
                nodes: 0,
                color: 0,
                encode: 0,
                spatial: 0,
            });
        }
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = (build_index, tracer);
        }
    }
}

/// Returns `true` if `a` is a strict composed or literal ancestor of `b`.
fn is_ancestor(topo: &Topology, a: u32, b: u32) -> bool {
    a != b && (topo.is_composed_ancestor(a, b) || topo.is_tree_ancestor_or_self(a, b))
}

fn insert_root(roots: &mut Vec<DirtyRoot>, topo: &Topology, node: NodeId, state: DirtState) {
    for root in roots.iter_mut() {
        if root.node == node
            || (root.state.is_structural() && is_ancestor(topo, root.node.idx, node.idx))
        {
            root.state |= state;
            return;
        }
    }
    let mut state = state;
    if state.is_structural() {
        roots.retain(|root| {
            let covered = is_ancestor(topo, node.idx, root.node.idx);
            if covered {
                state |= root.state;
            }
            !covered
        });
    }
    roots.push(DirtyRoot { node, state });
}

/// The mutable state of one build, borrowed from the cache and the tree.
struct BuildPass<'a, 't, B2: CommandBuffer, B3: CommandBuffer> {
    collector: Collector<'a, B2::Command, B3::Command>,
    contexts: &'a mut BTreeMap<NodeId, RenderContext<B2, B3>>,
    // Viewport slots whose contexts were rebuilt in this build.
    rebuilt: Vec<u32>,
    stats: BuildStats,
    tracer: &'a mut Tracer<'t>,
    build_index: u64,
    root: u32,
}

impl<B2, B3> BuildPass<'_, '_, B2, B3>
where
    B2: CommandBuffer + Default,
    B3: CommandBuffer + Default,
{
    fn skip(&mut self, node: NodeId, reason: SkipReason) {
        self.tracer.skip(&SkipEvent {
            build_index: self.build_index,
            node,
            reason,
        });
    }

    fn process(&mut self, dirty_root: DirtyRoot) {
        let topo = self.collector.topo();
        let DirtyRoot { node, state } = dirty_root;
        let idx = node.idx;
        let i = idx as usize;
        if !topo.is_rendered(idx, self.root) {
            self.skip(node, SkipReason::NotRendered);
            return;
        }

        if topo.kind[i] == NodeKind::Viewport {
            if self.rebuilt.contains(&idx) {
                self.skip(node, SkipReason::ContextRebuilt);
            } else if idx != self.root && !topo.visible[i] {
                self.skip(node, SkipReason::Hidden);
            } else if state.is_structural() {
                self.rebuild(idx);
            }
            return;
        }

        let context = topo.context_of(idx);
        if self.rebuilt.contains(&context) {
            self.skip(node, SkipReason::ContextRebuilt);
            return;
        }
        if !state.is_structural() && !topo.visible[i] {
            self.skip(node, SkipReason::Hidden);
            return;
        }

        let context_id = topo.id(context);
        let ctx = self.contexts.entry(context_id).or_default();
        if !self.collector.is_placed(idx, context, &ctx.nodes) {
            // The context never placed this node: its layout is unknown.
            self.rebuild(context);
            return;
        }
        let (kind, patch) = if state.is_structural() {
            (
                CollectKind::Subtree,
                self.collector.collect_subtree(idx, context, ctx),
            )
        } else {
            (
                CollectKind::Commands,
                self.collector.collect_commands(idx, context, ctx),
            )
        };
        self.stats.collected += 1;
        self.tracer.collect(&CollectEvent {
            build_index: self.build_index,
            node,
            context: context_id,
            kind,
            patch,
        });
    }

    fn rebuild(&mut self, viewport: u32) {
        let id = self.collector.topo().id(viewport);
        let ctx = self.contexts.entry(id).or_default();
        self.collector.rebuild_context(viewport, ctx);
        self.rebuilt.push(viewport);
        self.stats.collected += 1;
        #[cfg(feature = "trace-rich")]
        self.tracer.context(&crate::trace::ContextEvent {
            build_index: self.build_index,
            viewport: id,
            change: crate::trace::ContextChange::Rebuilt,
            nodes: to_pos(ctx.nodes.len()),
            color: to_pos(ctx.color.len()),
            encode: to_pos(ctx.encode.len()),
            spatial: to_pos(ctx.spatial.len()),
        });
        self.tracer.collect(&CollectEvent {
            build_index: self.build_index,
            node: id,
            context: id,
            kind: CollectKind::Context,
            patch: Patch::default(),
        });
    }

    /// Rebuilds the contexts of viewports reached by the last collection.
    fn drain_nested(&mut self) {
        while let Some(viewport) = self.collector.nested.pop() {
            if !self.rebuilt.contains(&viewport) {
                self.rebuild(viewport);
            }
        }
    }
}

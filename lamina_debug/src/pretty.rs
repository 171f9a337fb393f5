// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use lamina_core::node::{Dimension, NodeId};
use lamina_core::trace::{
    BuildBeginEvent, BuildEndEvent, CollectEvent, CollectKind, ContextChange, ContextEvent,
    SkipEvent, SkipReason, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// `index@generation`, the short form used in every line.
pub(crate) struct Short(pub(crate) NodeId);

impl std::fmt::Display for Short {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.0.index(), self.0.generation())
    }
}

fn kind_name(kind: CollectKind) -> &'static str {
    match kind {
        CollectKind::Commands => "commands",
        CollectKind::Subtree => "subtree",
        CollectKind::Context => "context",
    }
}

fn reason_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Stale => "stale",
        SkipReason::NotRendered => "not-rendered",
        SkipReason::ContextRebuilt => "context-rebuilt",
        SkipReason::Hidden => "hidden",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_build_begin(&mut self, e: &BuildBeginEvent) {
        let collapsed = if e.collapsed { " collapsed" } else { "" };
        let _ = writeln!(
            self.writer,
            "[build:begin] build={} roots={} contexts={}{collapsed}",
            e.build_index, e.roots, e.contexts,
        );
    }

    fn on_collect(&mut self, e: &CollectEvent) {
        let lane = match e.patch.dimension {
            Dimension::Flat => "2d",
            Dimension::Spatial => "3d",
        };
        let _ = writeln!(
            self.writer,
            "[collect] build={} {} node={} context={} at={} nodes={:+} {lane}={:+}/{:+}",
            e.build_index,
            kind_name(e.kind),
            Short(e.node),
            Short(e.context),
            e.patch.index,
            e.patch.nodes,
            e.patch.commands.color,
            e.patch.commands.encode,
        );
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] build={} node={} {}",
            e.build_index,
            Short(e.node),
            reason_name(e.reason),
        );
    }

    fn on_build_end(&mut self, e: &BuildEndEvent) {
        let _ = writeln!(
            self.writer,
            "[build:end] build={} roots={} collected={} splices={}",
            e.build_index, e.stats.roots, e.stats.collected, e.stats.splices,
        );
    }

    fn on_context(&mut self, e: &ContextEvent) {
        let change = match e.change {
            ContextChange::Rebuilt => "rebuilt",
            ContextChange::Pruned => "pruned",
        };
        let _ = writeln!(
            self.writer,
            "[context] build={} viewport={} {change} nodes={} color={} encode={} spatial={}",
            e.build_index,
            Short(e.viewport),
            e.nodes,
            e.color,
            e.encode,
            e.spatial,
        );
    }
}

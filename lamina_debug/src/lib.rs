// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and JSON snapshots for lamina diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](lamina_core::trace::TraceSink)
//!   writing one human-readable line per build event.
//! - [`snapshot`]: turns render contexts into [`serde_json::Value`] trees for
//!   golden files and bug reports.

pub mod pretty;
pub mod snapshot;

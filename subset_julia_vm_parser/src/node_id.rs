//! Identity for AST nodes.
//!
//! The attribute reactor (`subset_julia_vm::reactor`) keys every semantic
//! attribute on `(NodeId, &'static str)`. A write-once dataflow engine needs
//! a stable handle per node, so every AST node carries one of these,
//! assigned by `NodeIdGen`.

use std::sync::atomic::{AtomicU32, Ordering};

/// Opaque identity for an AST node, unique within one `NodeIdGen`'s lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel used only by default-constructing test fixtures; never
    /// produced by `NodeIdGen`.
    pub const DANGLING: NodeId = NodeId(u32::MAX);
}

/// Monotonic generator for `NodeId`s, one per AST being built.
///
/// Builders (see `ast::build`) hold a `NodeIdGen` and call `next()` once per
/// node so that two distinct nodes never collide as reactor keys.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    counter: AtomicU32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    pub fn next(&self) -> NodeId {
        NodeId(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

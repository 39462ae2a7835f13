// crates/pmc-rs/src/log.rs
use uuid::Uuid;

use crate::schema::{NodeKind, TreeKind};

/// Trait for structs that provide metadata for logging
pub trait LogMetadata {
    fn meta(&self) -> String;
}

/// Identifies the node a log line is about.
pub struct NodeContext {
    pub tree: TreeKind,
    pub kind: NodeKind,
    pub uuid: Uuid,
}

impl NodeContext {
    pub fn new(tree: TreeKind, kind: NodeKind, uuid: Uuid) -> Self {
        Self { tree, kind, uuid }
    }
}

impl LogMetadata for NodeContext {
    fn meta(&self) -> String {
        format!(
            "tree={}, kind={}, uuid={}",
            self.tree.name(),
            self.kind.tag(),
            self.uuid
        )
    }
}

// =============================================
// Logging Macros (namespaced under crate::log)
// =============================================

// ===== pm_info! =====
macro_rules! pm_info {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::info!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
    ($fmt:literal $(, $($arg:tt)+)?) => {{
        log::info!($fmt $(, $($arg)+)?);
    }};
}

// ===== pm_warn! =====
macro_rules! pm_warn {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::warn!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
    ($fmt:literal $(, $($arg:tt)+)?) => {{
        log::warn!($fmt $(, $($arg)+)?);
    }};
}

// ===== pm_debug! =====
macro_rules! pm_debug {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::debug!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
    ($fmt:literal $(, $($arg:tt)+)?) => {{
        log::debug!($fmt $(, $($arg)+)?);
    }};
}

// Re-export macros for use in other files
pub(crate) use pm_debug;
pub(crate) use pm_info;
pub(crate) use pm_warn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_context_meta_names_tree_kind_and_uuid() {
        let uuid = Uuid::nil();
        let ctx = NodeContext::new(TreeKind::Can, NodeKind::Signal, uuid);
        assert_eq!(
            ctx.meta(),
            "tree=can, kind=signal, uuid=00000000-0000-0000-0000-000000000000"
        );
    }
}

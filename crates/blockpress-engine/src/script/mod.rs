//! Script runtimes for JavaScript embeds.
//!
//! The built-in runtime is feature-gated behind `js-runtime` (on by
//! default). Each execution gets a fresh interpreter, so embeds never see
//! each other's globals.

use std::sync::Arc;

use crate::controllers::embed::ScriptRuntime;

#[cfg(feature = "js-runtime")]
mod boa;

#[cfg(feature = "js-runtime")]
pub use boa::BoaRuntime;

pub const DEFAULT_LOOP_ITERATION_LIMIT: u64 = 1_000_000;
pub const DEFAULT_RECURSION_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSettings {
    /// Whether embeds may run JavaScript at all.
    pub enabled: bool,
    /// Iterations a single loop may run before the script is stopped.
    pub loop_iteration_limit: u64,
    pub recursion_limit: usize,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            loop_iteration_limit: DEFAULT_LOOP_ITERATION_LIMIT,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl ScriptSettings {
    /// The built-in runtime, or `None` when scripts are disabled or the
    /// runtime is not compiled in.
    pub fn runtime(&self) -> Option<Arc<dyn ScriptRuntime>> {
        if !self.enabled {
            return None;
        }

        #[cfg(feature = "js-runtime")]
        let runtime: Option<Arc<dyn ScriptRuntime>> = Some(Arc::new(BoaRuntime::new(*self)));

        #[cfg(not(feature = "js-runtime"))]
        let runtime = {
            log::warn!("scripts are enabled but blockpress was built without `js-runtime`");
            None
        };

        runtime
    }
}

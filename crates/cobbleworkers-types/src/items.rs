//! Item stacks carried between a harvest and a deposit.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A stack of identical items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ItemStack {
    /// Namespaced item id, e.g. `minecraft:wheat`.
    pub item: String,
    /// Number of items in the stack.
    pub count: u32,
    /// Largest count a single stack of this item may hold.
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
}

const fn default_max_stack() -> u32 {
    ItemStack::DEFAULT_MAX_STACK
}

impl ItemStack {
    /// Default stack limit for most items.
    pub const DEFAULT_MAX_STACK: u32 = 64;

    /// A stack with the default stack limit.
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
            max_stack: Self::DEFAULT_MAX_STACK,
        }
    }

    /// Override the stack limit.
    #[must_use]
    pub const fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack;
        self
    }

    /// Whether the stack holds no items.
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_limit_defaults_when_omitted() {
        let stack: Result<ItemStack, _> =
            serde_json::from_str(r#"{"item":"minecraft:honeycomb","count":3}"#);
        assert_eq!(stack.ok(), Some(ItemStack::new("minecraft:honeycomb", 3)));
    }
}

//! Items an agent carries between harvesting and depositing.

use std::collections::BTreeSet;

use cobbleworkers_types::{BlockPos, ItemStack};

/// Stacks carried by one agent, in pickup order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldItems {
    stacks: Vec<ItemStack>,
}

impl HeldItems {
    /// Whether nothing is carried.
    pub fn is_empty(&self) -> bool {
        self.stacks.iter().all(ItemStack::is_empty)
    }

    /// Carried stacks.
    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    /// Add stacks, skipping empty ones.
    pub fn extend(&mut self, stacks: impl IntoIterator<Item = ItemStack>) {
        self.stacks
            .extend(stacks.into_iter().filter(|s| !s.is_empty()));
    }

    /// Replace the carried stacks with what a container did not accept.
    pub fn replace(&mut self, remainder: Vec<ItemStack>) {
        self.stacks = remainder;
        self.stacks.retain(|s| !s.is_empty());
    }

    /// Remove and return everything.
    pub fn take(&mut self) -> Vec<ItemStack> {
        std::mem::take(&mut self.stacks)
    }

    /// Total item count.
    pub fn total(&self) -> u64 {
        self.stacks
            .iter()
            .fold(0_u64, |acc, s| acc.saturating_add(u64::from(s.count)))
    }
}

/// Storage positions that refused a deposit during the current carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailedDeposits {
    positions: BTreeSet<BlockPos>,
}

impl FailedDeposits {
    /// Remember a container that refused items.
    pub fn insert(&mut self, pos: BlockPos) {
        self.positions.insert(pos);
    }

    /// Whether the container already refused items.
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.positions.contains(&pos)
    }

    /// Forget all refusals.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Whether no container has refused.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of refusing containers.
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

/// Double every stack, splitting results above the stack limit.
///
/// A stack of 40 with a limit of 64 becomes 64 + 16.
pub fn double_stacks(stacks: &[ItemStack]) -> Vec<ItemStack> {
    let mut doubled = Vec::with_capacity(stacks.len());
    for stack in stacks {
        let limit = stack.max_stack.max(1);
        let mut remaining = stack.count.saturating_mul(2);
        while remaining > 0 {
            let count = remaining.min(limit);
            doubled.push(ItemStack {
                item: stack.item.clone(),
                count,
                max_stack: stack.max_stack,
            });
            remaining = remaining.saturating_sub(count);
        }
    }
    doubled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_splits_at_max_stack() {
        let doubled = double_stacks(&[ItemStack::new("minecraft:wheat", 40)]);
        let counts: Vec<u32> = doubled.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![64, 16]);
        assert!(doubled.iter().all(|s| s.item == "minecraft:wheat"));
    }

    #[test]
    fn doubling_respects_small_limits() {
        let pearls = ItemStack::new("minecraft:ender_pearl", 10).with_max_stack(16);
        let counts: Vec<u32> = double_stacks(&[pearls]).iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![16, 4]);

        let sword = ItemStack::new("minecraft:iron_sword", 1).with_max_stack(1);
        assert_eq!(double_stacks(&[sword]).len(), 2);
    }

    #[test]
    fn doubling_skips_empty_stacks() {
        assert!(double_stacks(&[ItemStack::new("minecraft:air", 0)]).is_empty());
    }

    #[test]
    fn held_items_track_remainder() {
        let mut held = HeldItems::default();
        assert!(held.is_empty());
        held.extend([ItemStack::new("minecraft:carrot", 3), ItemStack::new("minecraft:stick", 0)]);
        assert_eq!(held.stacks().len(), 1);
        assert_eq!(held.total(), 3);

        let taken = held.take();
        assert!(held.is_empty());
        held.replace(taken);
        assert!(!held.is_empty());
        held.replace(Vec::new());
        assert!(held.is_empty());
    }

    #[test]
    fn failed_deposits_are_a_set() {
        let mut failed = FailedDeposits::default();
        failed.insert(BlockPos::ORIGIN);
        failed.insert(BlockPos::ORIGIN);
        assert_eq!(failed.len(), 1);
        assert!(failed.contains(BlockPos::ORIGIN));
        failed.clear();
        assert!(failed.is_empty());
    }
}

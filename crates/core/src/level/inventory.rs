//! Item counters held by the actor during one attempt.

use std::collections::BTreeMap;

use crate::types::ItemKind;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    counts: BTreeMap<ItemKind, u32>,
}

impl Inventory {
    pub fn count(&self, item: ItemKind) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    pub fn has(&self, item: ItemKind) -> bool {
        self.count(item) > 0
    }

    pub fn add(&mut self, item: ItemKind, amount: u32) {
        if item == ItemKind::Unknown || amount == 0 {
            return;
        }
        *self.counts.entry(item).or_insert(0) += amount;
    }

    pub fn set(&mut self, item: ItemKind, amount: u32) {
        if amount == 0 {
            self.counts.remove(&item);
        } else if item != ItemKind::Unknown {
            self.counts.insert(item, amount);
        }
    }

    /// Removes every unit of `item`, returning how many were held.
    pub fn take_all(&mut self, item: ItemKind) -> u32 {
        self.counts.remove(&item).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.counts.iter().map(|(item, count)| (*item, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_items_are_never_held() {
        let mut inventory = Inventory::default();
        inventory.add(ItemKind::Unknown, 3);
        inventory.set(ItemKind::Unknown, 3);
        assert!(!inventory.has(ItemKind::Unknown));
        assert!(inventory.is_empty());
    }

    #[test]
    fn set_to_zero_drops_the_entry() {
        let mut inventory = Inventory::default();
        inventory.add(ItemKind::PortalKey, 1);
        inventory.add(ItemKind::PortalKey, 1);
        assert_eq!(inventory.count(ItemKind::PortalKey), 2);

        inventory.set(ItemKind::PortalKey, 0);
        assert!(!inventory.has(ItemKind::PortalKey));
        assert_eq!(inventory.take_all(ItemKind::PortalKey), 0);
    }
}

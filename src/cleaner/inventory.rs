//! The in-memory list of found artifacts and their selection state.

use std::collections::HashSet;
use std::path::Path;

use crate::scanner::Item;

/// Ordered collection of items, at most one per path.
///
/// Mutations take `&mut self` and assume a single writer at a time: the
/// thread that dispatches user commands owns the store and applies cleanup
/// results itself. Nothing here locks.
#[derive(Debug, Clone, Default)]
pub struct InventoryStore {
    items: Vec<Item>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current contents and take `items`, keeping their order.
    /// A repeated path keeps its first occurrence.
    pub fn replace(&mut self, items: Vec<Item>) {
        let mut seen = HashSet::with_capacity(items.len());
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.path.clone()))
            .collect();
    }

    /// Flip the selection of `path`, returning the new state, or `None` if
    /// the path is not in the inventory.
    pub fn toggle(&mut self, path: &Path) -> Option<bool> {
        let item = self.items.iter_mut().find(|i| i.path == path)?;
        item.selected = !item.selected;
        Some(item.selected)
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for item in &mut self.items {
            item.selected = selected;
        }
    }

    /// Remove and return the item at `path`.
    pub fn remove(&mut self, path: &Path) -> Option<Item> {
        let index = self.items.iter().position(|i| i.path == path)?;
        Some(self.items.remove(index))
    }

    /// Selected items in inventory order.
    pub fn selected_items(&self) -> Vec<Item> {
        self.items.iter().filter(|i| i.selected).cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected).count()
    }

    /// Sum of the cached sizes of selected items.
    pub fn total_selected_size(&self) -> u64 {
        self.items
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.size)
            .sum()
    }

    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|i| i.size).sum()
    }

    pub fn get(&self, path: &Path) -> Option<&Item> {
        self.items.iter().find(|i| i.path == path)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

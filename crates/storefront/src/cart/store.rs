//! The local, optimistic cart.

use shophub_core::{LineItem, ProductId, Quantity};

/// The client's believed view of the cart.
///
/// An owned value with one instance per user session. Entries are unique by
/// product ID and keep insertion order. All operations are synchronous and
/// never fail; none of them touch the network.
///
/// Every change to the contents bumps [`CartStore::revision`], which lets the
/// synchronizer record which state the server last acknowledged.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    items: Vec<LineItem>,
    revision: u64,
    synced_revision: Option<u64>,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, typically with a freshly fetched
    /// server cart.
    ///
    /// Duplicate product IDs in `items` are collapsed into the first
    /// occurrence by summing their quantities.
    pub fn set_cart(&mut self, items: impl IntoIterator<Item = LineItem>) {
        let mut merged: Vec<LineItem> = Vec::new();
        for item in items {
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
                None => merged.push(item),
            }
        }

        if merged != self.items {
            self.items = merged;
            self.bump();
        }
    }

    /// Add `item`, or increase the quantity of the existing entry for the
    /// same product. Returns the resulting quantity.
    pub fn add_item(&mut self, item: LineItem) -> Quantity {
        self.bump();
        if let Some(existing) = self.find_mut(&item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            return existing.quantity;
        }
        let quantity = item.quantity;
        self.items.push(item);
        quantity
    }

    /// Set the quantity of an existing entry. Returns `false` (and changes
    /// nothing) if the product is not in the cart.
    pub fn update_item(&mut self, product_id: &ProductId, quantity: Quantity) -> bool {
        let Some(existing) = self.find_mut(product_id) else {
            return false;
        };
        if existing.quantity != quantity {
            existing.quantity = quantity;
            self.bump();
        }
        true
    }

    /// Remove the entry for `product_id`. Removing an absent product is a
    /// no-op; returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.bump();
        }
        removed
    }

    pub fn clear_cart(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.bump();
        }
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Sum of all quantities (the cart badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// A copy of the current contents, for pushing or ordering.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.items.clone()
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Record that the server acknowledged the contents as of `revision`.
    pub const fn mark_synced(&mut self, revision: u64) {
        self.synced_revision = Some(revision);
    }

    /// Whether the last acknowledged push covers the current contents.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.synced_revision == Some(self.revision)
    }

    fn find_mut(&mut self, product_id: &ProductId) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
    }

    const fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, quantity: u32) -> LineItem {
        LineItem::new(id, Quantity::new(quantity).unwrap())
    }

    fn pid(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_item_upserts() {
        let mut store = CartStore::new();
        store.add_item(item("a", 1));
        store.add_item(item("b", 2));
        let quantity = store.add_item(item("a", 3));

        assert_eq!(quantity.get(), 4);
        assert_eq!(store.len(), 2);
        assert_eq!(store.items()[0], item("a", 4));
        assert_eq!(store.items()[1], item("b", 2));
    }

    #[test]
    fn test_never_holds_duplicates() {
        let mut store = CartStore::new();
        for id in ["a", "b", "a", "c", "b", "a"] {
            store.add_item(item(id, 1));
        }
        let mut ids: Vec<&str> = store.items().iter().map(|i| i.product_id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
        assert_eq!(store.len(), 3);
        assert_eq!(store.total_quantity(), 6);
    }

    #[test]
    fn test_set_cart_collapses_duplicates() {
        let mut store = CartStore::new();
        store.set_cart(vec![item("a", 1), item("b", 1), item("a", 2)]);
        assert_eq!(store.items(), &[item("a", 3), item("b", 1)]);
    }

    #[test]
    fn test_update_item() {
        let mut store = CartStore::new();
        store.add_item(item("a", 1));

        assert!(store.update_item(&pid("a"), Quantity::new(5).unwrap()));
        assert_eq!(store.get(&pid("a")).unwrap().quantity.get(), 5);

        // Absent product is a no-op
        assert!(!store.update_item(&pid("zzz"), Quantity::ONE));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_item_is_idempotent() {
        let mut store = CartStore::new();
        store.add_item(item("a", 1));
        assert!(store.remove_item(&pid("a")));
        assert!(!store.remove_item(&pid("a")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_cart() {
        let mut store = CartStore::new();
        store.add_item(item("a", 1));
        store.add_item(item("b", 1));
        store.clear_cart();
        assert!(store.is_empty());
        store.clear_cart();
        assert!(store.is_empty());
    }

    #[test]
    fn test_revision_tracks_changes() {
        let mut store = CartStore::new();
        assert!(!store.is_synced());

        store.add_item(item("a", 1));
        let revision = store.revision();
        store.mark_synced(revision);
        assert!(store.is_synced());

        // No-op mutations keep the store in sync
        store.update_item(&pid("a"), Quantity::ONE);
        store.remove_item(&pid("missing"));
        store.set_cart(vec![item("a", 1)]);
        assert!(store.is_synced());

        store.update_item(&pid("a"), Quantity::new(2).unwrap());
        assert!(!store.is_synced());
        assert!(store.revision() > revision);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = CartStore::new();
        store.add_item(item("a", 1));
        let snapshot = store.snapshot();
        store.clear_cart();
        assert_eq!(snapshot, vec![item("a", 1)]);
    }
}

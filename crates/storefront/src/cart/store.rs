//! Persistent, observable cart.

use bakery_core::{Cart, Money, Product, ProductId, StockAdjustment};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

use super::bus::{CartBus, CartChange};
use super::storage::CartStorage;

/// Serialized form of an empty cart.
const EMPTY_CART: &str = "[]";

/// The shopper's cart, backed by durable storage.
///
/// Every mutation writes the whole cart to storage and publishes a
/// [`CartChange`]. Storage failures are logged and otherwise ignored: an
/// unreadable cart hydrates as empty and a failed write leaves the in-memory
/// cart authoritative.
#[derive(Debug)]
pub struct CartStore<S> {
    id: Uuid,
    storage: S,
    bus: CartBus,
    receiver: broadcast::Receiver<CartChange>,
    cart: Cart,
    /// Serialized copy of `cart`, compared against storage on sync.
    serialized: String,
}

impl<S: CartStorage> CartStore<S> {
    /// Hydrate a store from `storage` and start listening on `bus`.
    pub fn open(storage: S, bus: CartBus) -> Self {
        let cart = hydrate(&storage);
        let serialized = serialize(&cart);
        let receiver = bus.subscribe();

        tracing::debug!(items = cart.item_count(), "Cart hydrated");

        Self {
            id: Uuid::new_v4(),
            storage,
            bus,
            receiver,
            cart,
            serialized,
        }
    }

    /// Identifier carried in this store's notifications.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Subtotal: sum of `price * quantity`.
    #[must_use]
    pub fn total(&self) -> Money {
        self.cart.total()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product`, clamped to its stock.
    ///
    /// Returns the entry's resulting quantity (0 if nothing could be added).
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> u32 {
        let result = self.cart.add_item(product, quantity);
        self.commit();
        result
    }

    /// Set a quantity; zero or less removes the entry.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        self.cart.update_quantity(product_id, quantity);
        self.commit();
    }

    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.cart.remove_item(product_id);
        self.commit();
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.commit();
    }

    /// Sync one entry against authoritative stock.
    pub fn apply_stock(&mut self, product_id: &ProductId, stock: u32) -> Option<StockAdjustment> {
        let adjustment = self.cart.apply_stock(product_id, stock);
        self.commit();
        adjustment
    }

    fn commit(&mut self) {
        self.serialized = serialize(&self.cart);
        if let Err(e) = self.storage.write(&self.serialized) {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
        self.bus.publish(CartChange {
            origin: self.id,
            item_count: self.cart.item_count(),
        });
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// React to a change notification.
    ///
    /// Changes this store published itself are ignored. Otherwise storage is
    /// re-read and the cart replaced only if the stored cart differs from the
    /// in-memory copy. Never publishes. Returns whether the cart changed.
    pub fn handle_change(&mut self, change: &CartChange) -> bool {
        if change.origin == self.id {
            return false;
        }
        self.reload()
    }

    /// Re-read storage, replacing the cart if the stored cart differs.
    ///
    /// Picks up writes made without a notification. A storage read failure
    /// keeps the in-memory cart.
    pub fn reload(&mut self) -> bool {
        let stored = match self.storage.read() {
            Ok(stored) => stored.unwrap_or_else(|| EMPTY_CART.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to re-read cart storage");
                return false;
            }
        };

        // Compare in canonical form: stored text may be un-normalized
        let cart = parse(&stored);
        let canonical = serialize(&cart);
        if canonical == self.serialized {
            return false;
        }

        self.cart = cart;
        self.serialized = canonical;
        tracing::debug!(items = self.cart.item_count(), "Cart re-hydrated from storage");
        true
    }

    /// Handle every pending notification. Returns whether the cart changed.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(change) => changed |= self.handle_change(&change),
                // Missed notifications: storage holds the latest state anyway
                Err(TryRecvError::Lagged(_)) => changed |= self.reload(),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return changed,
            }
        }
    }
}

fn hydrate(storage: &impl CartStorage) -> Cart {
    match storage.read() {
        Ok(Some(contents)) => parse(&contents),
        Ok(None) => Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Cart storage unreadable, starting empty");
            Cart::new()
        }
    }
}

fn parse(contents: &str) -> Cart {
    match serde_json::from_str::<Cart>(contents) {
        Ok(cart) => cart.normalized(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored cart is corrupt, starting empty");
            Cart::new()
        }
    }
}

fn serialize(cart: &Cart) -> String {
    serde_json::to_string(cart).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to serialize cart");
        EMPTY_CART.to_string()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartBadge, MemoryStorage, StorageError};

    /// Storage that is always unavailable.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn read(&self) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn write(&self, _contents: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn product(id: &str, cents: i64, stock: u32) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Producto {id}"),
            "price": Money::from_minor_units(cents),
            "stock": stock,
        }))
        .unwrap()
    }

    #[test]
    fn test_mutations_persist_full_cart() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), CartBus::new());

        store.add_item(&product("1", 350, 10), 2);
        store.add_item(&product("2", 1200, 3), 1);

        let stored: Cart = serde_json::from_str(&storage.read().unwrap().unwrap()).unwrap();
        assert_eq!(&stored, store.cart());
        assert_eq!(store.item_count(), 3);
        assert_eq!(store.total(), Money::from_minor_units(1_900));
    }

    #[test]
    fn test_hydrate_round_trip() {
        let storage = MemoryStorage::new();
        let bus = CartBus::new();
        let mut first = CartStore::open(storage.clone(), bus.clone());
        first.add_item(&product("1", 350, 10), 4);
        first.add_item(&product("7", 990, 2), 2);

        let second = CartStore::open(storage, bus);
        assert_eq!(second.cart(), first.cart());
    }

    #[test]
    fn test_corrupt_storage_hydrates_empty() {
        let storage = MemoryStorage::new();
        storage.write("{not json").unwrap();

        let store = CartStore::open(storage, CartBus::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_broken_storage_is_never_surfaced() {
        let mut store = CartStore::open(BrokenStorage, CartBus::new());
        assert!(store.is_empty());

        assert_eq!(store.add_item(&product("1", 350, 10), 2), 2);
        assert_eq!(store.item_count(), 2);
        assert!(!store.reload());
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_mutations_publish_item_count() {
        let bus = CartBus::new();
        let mut badge = CartBadge::new(&bus, 0);
        let mut store = CartStore::open(MemoryStorage::new(), bus);

        store.add_item(&product("1", 350, 10), 3);
        assert_eq!(badge.refresh(), 3);

        store.update_quantity(&ProductId::new("1"), 0);
        assert_eq!(badge.refresh(), 0);
    }

    #[test]
    fn test_own_changes_are_ignored() {
        let mut store = CartStore::open(MemoryStorage::new(), CartBus::new());
        store.add_item(&product("1", 350, 10), 1);

        assert!(!store.sync());
    }

    #[test]
    fn test_cross_store_sync() {
        let storage = MemoryStorage::new();
        let bus = CartBus::new();
        let mut first = CartStore::open(storage.clone(), bus.clone());
        let mut second = CartStore::open(storage, bus.clone());
        let mut listener = bus.subscribe();

        first.add_item(&product("1", 350, 10), 2);
        let published = listener.try_recv().unwrap();

        assert!(second.sync());
        assert_eq!(second.cart(), first.cart());

        // Re-hydration does not publish, so nothing bounces back
        assert!(matches!(listener.try_recv(), Err(TryRecvError::Empty)));
        assert!(!first.sync());
        assert_eq!(published.origin, first.id());
    }

    #[test]
    fn test_handle_change_skips_identical_content() {
        let storage = MemoryStorage::new();
        let bus = CartBus::new();
        let mut store = CartStore::open(storage, bus);
        store.add_item(&product("1", 350, 10), 2);

        let foreign = CartChange {
            origin: Uuid::new_v4(),
            item_count: 2,
        };
        assert!(!store.handle_change(&foreign));
    }

    #[test]
    fn test_reload_picks_up_direct_writes() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), CartBus::new());
        store.add_item(&product("1", 350, 10), 2);

        storage.write(EMPTY_CART).unwrap();
        assert!(store.reload());
        assert!(store.is_empty());
    }

    #[test]
    fn test_unnormalized_storage_reports_one_change() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), CartBus::new());
        let foreign = CartChange {
            origin: Uuid::new_v4(),
            item_count: 3,
        };

        // Written by another client: over stock, with a duplicate entry
        let line = |quantity: u32| {
            serde_json::json!({
                "id": "1",
                "name": "Producto 1",
                "price": Money::from_minor_units(350),
                "stock": 3,
                "quantity": quantity,
            })
        };
        storage
            .write(&serde_json::json!([line(9), line(1)]).to_string())
            .unwrap();

        assert!(store.handle_change(&foreign));
        assert_eq!(store.item_count(), 3);
        assert!(!store.handle_change(&foreign));
        assert!(!store.reload());
    }

    #[test]
    fn test_open_on_unnormalized_storage_is_stable() {
        let storage = MemoryStorage::new();
        let mut first = CartStore::open(storage.clone(), CartBus::new());
        first.add_item(&product("1", 350, 10), 2);
        let pretty = serde_json::to_string_pretty(first.cart()).unwrap();
        storage.write(&pretty).unwrap();

        let mut second = CartStore::open(storage, CartBus::new());
        assert!(!second.reload());
        assert_eq!(second.cart(), first.cart());
    }

    #[test]
    fn test_clear_writes_empty_array() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage.clone(), CartBus::new());
        store.add_item(&product("1", 350, 10), 2);

        store.clear();
        assert_eq!(storage.read().unwrap().as_deref(), Some(EMPTY_CART));
        assert_eq!(store.item_count(), 0);
    }
}

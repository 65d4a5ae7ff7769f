use std::sync::Arc;

use chrono::{Duration, Utc};
use crimson_core::repository::InventoryRepository;
use crimson_core::{CopyStatus, StoreError};
use tracing::{info, warn};

use crate::error::CartError;
use crate::models::{CartEntry, SessionContext};

/// Tracks a session's working set of reserved copies.
///
/// The cart has no storage of its own: it *is* the set of copies whose
/// reservation owner is this session. Adding reserves, removing releases,
/// and a successful checkout consumes the entries by selling them.
pub struct CartManager {
    inventory: Arc<dyn InventoryRepository>,
    reservation_ttl: Duration,
}

impl CartManager {
    pub fn new(inventory: Arc<dyn InventoryRepository>, reservation_ttl: Duration) -> Self {
        Self {
            inventory,
            reservation_ttl,
        }
    }

    /// Reserves a copy for this session and adds it to the cart.
    pub async fn add(&self, session: &SessionContext, copy_id: i64) -> Result<CartEntry, CartError> {
        let copy = self
            .inventory
            .get_copy(copy_id)
            .await?
            .ok_or(CartError::NotFound(copy_id))?;

        match copy.status {
            CopyStatus::Sold => return Err(CartError::AlreadySold(copy_id)),
            CopyStatus::Reserved if copy.is_reserved_by(&session.session_id) => {
                return Err(CartError::DuplicateItem(copy_id));
            }
            CopyStatus::Reserved => return Err(CartError::AlreadyReserved(copy_id)),
            CopyStatus::InStore => {}
        }

        let until = Utc::now() + self.reservation_ttl;
        match self
            .inventory
            .reserve_copy(copy_id, &session.session_id, until)
            .await
        {
            Ok(()) => {}
            // Lost the race: someone else reserved or bought it between our
            // read and the conditional update.
            Err(StoreError::Conflict { .. }) => return Err(CartError::AlreadyReserved(copy_id)),
            Err(StoreError::NotFound { .. }) => return Err(CartError::NotFound(copy_id)),
            Err(other) => return Err(other.into()),
        }

        info!(copy_id, session = %session.session_id, "copy reserved");

        let mut entry = CartEntry::from(&copy);
        entry.reserved_until = Some(until);
        Ok(entry)
    }

    /// Releases a copy held by this session back to the shelf.
    pub async fn remove(&self, session: &SessionContext, copy_id: i64) -> Result<(), CartError> {
        match self
            .inventory
            .release_copy(copy_id, &session.session_id)
            .await
        {
            Ok(()) => {
                info!(copy_id, session = %session.session_id, "reservation released");
                Ok(())
            }
            Err(StoreError::Conflict { .. }) => Err(CartError::NotHeld(copy_id)),
            Err(StoreError::NotFound { .. }) => Err(CartError::NotFound(copy_id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Releases everything this session holds (logout / session expiry).
    /// Best effort: a store failure is logged, not propagated, so logout
    /// never blocks on the inventory store.
    pub async fn release_all(&self, session: &SessionContext) -> u64 {
        match self
            .inventory
            .release_all_for_session(&session.session_id)
            .await
        {
            Ok(released) => {
                if released > 0 {
                    info!(session = %session.session_id, released, "cart cleared");
                }
                released
            }
            Err(err) => {
                warn!(session = %session.session_id, error = %err, "failed to release cart");
                0
            }
        }
    }

    /// Current contents of the cart.
    pub async fn list(&self, session: &SessionContext) -> Result<Vec<CartEntry>, CartError> {
        let copies = self
            .inventory
            .list_reserved_by(&session.session_id)
            .await?;
        Ok(copies.iter().map(CartEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{copy_in_store, session, InMemoryInventory};

    fn manager(inventory: Arc<InMemoryInventory>) -> CartManager {
        CartManager::new(inventory, Duration::minutes(30))
    }

    #[tokio::test]
    async fn test_add_reserves_copy() {
        let inventory = Arc::new(InMemoryInventory::new(vec![copy_in_store(55, 4000)]));
        let cart = manager(inventory.clone());
        let sess = session(7, "sess-a");

        let entry = cart.add(&sess, 55).await.unwrap();
        assert_eq!(entry.copy_id, 55);
        assert_eq!(entry.quantity, 1);

        let copy = inventory.get(55);
        assert_eq!(copy.status, CopyStatus::Reserved);
        assert_eq!(copy.reserved_by.as_deref(), Some("sess-a"));
        assert!(copy.reserved_until.is_some());
    }

    #[tokio::test]
    async fn test_add_sold_copy_rejected() {
        let inventory = Arc::new(InMemoryInventory::new(vec![copy_in_store(55, 4000)]));
        inventory.force_sold(55);
        let cart = manager(inventory);

        let err = cart.add(&session(7, "sess-a"), 55).await.unwrap_err();
        assert!(matches!(err, CartError::AlreadySold(55)));
    }

    #[tokio::test]
    async fn test_add_twice_is_duplicate() {
        let inventory = Arc::new(InMemoryInventory::new(vec![copy_in_store(55, 4000)]));
        let cart = manager(inventory);
        let sess = session(7, "sess-a");

        cart.add(&sess, 55).await.unwrap();
        let err = cart.add(&sess, 55).await.unwrap_err();
        assert!(matches!(err, CartError::DuplicateItem(55)));
    }

    #[tokio::test]
    async fn test_add_held_by_other_session() {
        let inventory = Arc::new(InMemoryInventory::new(vec![copy_in_store(55, 4000)]));
        let cart = manager(inventory);

        cart.add(&session(7, "sess-a"), 55).await.unwrap();
        let err = cart.add(&session(8, "sess-b"), 55).await.unwrap_err();
        assert!(matches!(err, CartError::AlreadyReserved(55)));
    }

    #[tokio::test]
    async fn test_concurrent_add_single_winner() {
        let inventory = Arc::new(InMemoryInventory::new(vec![copy_in_store(55, 4000)]));
        let cart = Arc::new(manager(inventory));

        let a = {
            let cart = cart.clone();
            tokio::spawn(async move { cart.add(&session(7, "sess-a"), 55).await })
        };
        let b = {
            let cart = cart.clone();
            tokio::spawn(async move { cart.add(&session(8, "sess-b"), 55).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "exactly one session may reserve the copy");
        for r in results.iter().filter(|r| r.is_err()) {
            assert!(matches!(
                r.as_ref().unwrap_err(),
                CartError::AlreadyReserved(55)
            ));
        }
    }

    #[tokio::test]
    async fn test_remove_returns_copy_to_shelf() {
        let inventory = Arc::new(InMemoryInventory::new(vec![copy_in_store(3, 2500)]));
        let cart = manager(inventory.clone());
        let sess = session(7, "sess-a");

        cart.add(&sess, 3).await.unwrap();
        cart.remove(&sess, 3).await.unwrap();

        let copy = inventory.get(3);
        assert_eq!(copy.status, CopyStatus::InStore);
        assert!(copy.reserved_by.is_none());

        // Immediately visible to another session
        cart.add(&session(8, "sess-b"), 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_not_held() {
        let inventory = Arc::new(InMemoryInventory::new(vec![copy_in_store(3, 2500)]));
        let cart = manager(inventory);

        let err = cart.remove(&session(7, "sess-a"), 3).await.unwrap_err();
        assert!(matches!(err, CartError::NotHeld(3)));
    }

    #[tokio::test]
    async fn test_release_all_on_logout() {
        let inventory = Arc::new(InMemoryInventory::new(vec![
            copy_in_store(1, 1000),
            copy_in_store(2, 2000),
            copy_in_store(3, 3000),
        ]));
        let cart = manager(inventory.clone());
        let sess = session(7, "sess-a");

        cart.add(&sess, 1).await.unwrap();
        cart.add(&sess, 2).await.unwrap();

        assert_eq!(cart.release_all(&sess).await, 2);
        assert_eq!(inventory.get(1).status, CopyStatus::InStore);
        assert_eq!(inventory.get(2).status, CopyStatus::InStore);
        assert!(cart.list(&sess).await.unwrap().is_empty());
    }
}

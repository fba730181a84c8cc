//! # Register Sessions
//!
//! One [`CheckoutSession`] per register id, created on the first command that
//! changes a cart. Read-only lookups never open a session.
//!
//! Each session sits behind its own `tokio::sync::Mutex`: checkout awaits
//! the order service while holding the session, and a second command for
//! the same register waits its turn instead of seeing a half-cleared cart.
//! Different registers never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use tally_core::{CheckoutSession, Collaborators};

/// Registry of active register sessions.
#[derive(Debug)]
pub struct Registers {
    services: Collaborators,
    sessions: RwLock<HashMap<String, Arc<Mutex<CheckoutSession>>>>,
}

impl Registers {
    pub fn new(services: Collaborators) -> Self {
        Registers {
            services,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the session for `register_id`, opening one if needed.
    pub async fn session(&self, register_id: &str) -> Arc<Mutex<CheckoutSession>> {
        if let Some(session) = self.sessions.read().await.get(register_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(register_id.to_string())
            .or_insert_with(|| {
                info!(register_id, "Opening register session");
                Arc::new(Mutex::new(CheckoutSession::new(self.services.clone())))
            })
            .clone()
    }

    /// Returns the session for `register_id` if one is open.
    pub async fn get(&self, register_id: &str) -> Option<Arc<Mutex<CheckoutSession>>> {
        self.sessions.read().await.get(register_id).cloned()
    }

    /// Drops a register's session, discarding its cart.
    ///
    /// Returns whether a session existed.
    pub async fn close(&self, register_id: &str) -> bool {
        let closed = self.sessions.write().await.remove(register_id).is_some();
        if closed {
            debug!(register_id, "Register session closed");
        }
        closed
    }

    /// Ids of the registers with an open session, sorted.
    pub async fn register_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{demo_catalog, MemoryCatalog, MemoryOrderBook, StaticIdentity};

    fn registers() -> Registers {
        Registers::new(Collaborators {
            inventory: Arc::new(MemoryCatalog::with_products(demo_catalog())),
            identity: Arc::new(StaticIdentity::signed_in("staff-1")),
            orders: Arc::new(MemoryOrderBook::new()),
        })
    }

    #[tokio::test]
    async fn test_session_is_reused() {
        let registers = registers();

        let a = registers.session("front-1").await;
        let b = registers.session("front-1").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registers.register_ids().await, ["front-1"]);
    }

    #[tokio::test]
    async fn test_registers_are_isolated() {
        let registers = registers();
        let coffee = demo_catalog().remove(0);

        registers
            .session("front-1")
            .await
            .lock()
            .await
            .add_product(&coffee)
            .await
            .unwrap();

        let other = registers.session("front-2").await;
        assert!(other.lock().await.cart().is_empty());
        assert_eq!(registers.register_ids().await, ["front-1", "front-2"]);
    }

    #[tokio::test]
    async fn test_get_does_not_open_session() {
        let registers = registers();

        assert!(registers.get("front-9").await.is_none());
        assert!(registers.register_ids().await.is_empty());

        let opened = registers.session("front-9").await;
        let found = registers.get("front-9").await.unwrap();
        assert!(Arc::ptr_eq(&opened, &found));
    }

    #[tokio::test]
    async fn test_close_discards_cart() {
        let registers = registers();
        let coffee = demo_catalog().remove(0);
        registers
            .session("front-1")
            .await
            .lock()
            .await
            .add_product(&coffee)
            .await
            .unwrap();

        assert!(registers.close("front-1").await);
        assert!(!registers.close("front-1").await);
        assert!(registers.session("front-1").await.lock().await.cart().is_empty());
    }
}

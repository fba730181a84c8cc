//! # Tally Register Library
//!
//! Host for one or more POS registers: loads configuration, wires the
//! collaborators into per-register checkout sessions and exposes the
//! frontend-facing commands.
//!
//! ## Module Organization
//! ```text
//! tally_register/
//! ├── lib.rs          ◄─── You are here (logging & bootstrap)
//! ├── config.rs       ◄─── RegisterConfig (file + TALLY_* env)
//! ├── error.rs        ◄─── API error type for commands
//! ├── memory.rs       ◄─── In-memory catalog, identity, order book
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   └── registers.rs◄─── register id → session
//! └── commands/
//!     ├── mod.rs      ◄─── Command exports
//!     ├── cart.rs     ◄─── Cart manipulation commands
//!     └── checkout.rs ◄─── Checkout and reconciliation commands
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod memory;
pub mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_core::Collaborators;

use config::RegisterConfig;
use memory::{demo_catalog, MemoryCatalog, MemoryOrderBook, StaticIdentity};
use state::Registers;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally=trace` - Show trace for tally crates only
/// - Default: INFO, DEBUG for tally crates
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tally=debug"));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Everything a running register host holds.
pub struct RegisterHost {
    pub config: RegisterConfig,
    pub registers: Registers,
    pub catalog: Arc<MemoryCatalog>,
    pub identity: Arc<StaticIdentity>,
    pub orders: Arc<MemoryOrderBook>,
}

impl RegisterHost {
    /// Builds a host backed by the in-memory collaborators.
    ///
    /// ## Startup Sequence
    /// 1. Catalog, seeded with demo products if configured
    /// 2. Identity, signed in as `staff_id` if configured
    /// 3. Empty order book
    /// 4. Register registry sharing all three
    pub fn in_memory(config: RegisterConfig) -> Self {
        let catalog = Arc::new(if config.seed_demo_catalog {
            MemoryCatalog::with_products(demo_catalog())
        } else {
            MemoryCatalog::new()
        });

        let identity = Arc::new(match &config.staff_id {
            Some(staff_id) => StaticIdentity::signed_in(staff_id.clone()),
            None => StaticIdentity::signed_out(),
        });

        let orders = Arc::new(MemoryOrderBook::new());

        let registers = Registers::new(Collaborators {
            inventory: catalog.clone(),
            identity: identity.clone(),
            orders: orders.clone(),
        });

        info!(
            store = %config.store_name,
            register_id = %config.register_id,
            signed_in = config.staff_id.is_some(),
            "Register host ready"
        );

        RegisterHost {
            config,
            registers,
            catalog,
            identity,
            orders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::IdentityProvider;

    #[tokio::test]
    async fn test_in_memory_host_follows_config() {
        let host = RegisterHost::in_memory(RegisterConfig {
            staff_id: Some("staff-4".to_string()),
            ..Default::default()
        });
        assert_eq!(host.identity.current_user_id().await.as_deref(), Some("staff-4"));
        assert_eq!(host.catalog.list().await.len(), demo_catalog().len());

        let host = RegisterHost::in_memory(RegisterConfig {
            seed_demo_catalog: false,
            ..Default::default()
        });
        assert_eq!(host.identity.current_user_id().await, None);
        assert!(host.catalog.list().await.is_empty());
    }
}

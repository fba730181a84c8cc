//! # Tally Register Entry Point
//!
//! Walks one sale through a register backed by the in-memory collaborators:
//! build a cart, fail a checkout half-way, reconcile, and check out again.
//!
//! ## Usage
//! ```text
//! tally-register [path/to/register.toml]
//! RUST_LOG=tally=trace TALLY_STAFF_ID=staff-7 tally-register
//! ```

use std::path::PathBuf;

use tracing::{error, info, warn};

use tally_register::commands::{cart, checkout};
use tally_register::config::RegisterConfig;
use tally_register::error::{ApiError, ErrorCode};
use tally_register::memory::FailPoint;
use tally_register::{init_tracing, RegisterHost};

#[tokio::main]
async fn main() {
    init_tracing();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let mut config = RegisterConfig::load_or_default(config_path);
    if config.staff_id.is_none() {
        config.staff_id = Some("demo-cashier".to_string());
    }

    let host = RegisterHost::in_memory(config);
    if let Err(e) = run_demo(&host).await {
        error!(code = ?e.code, "Demo stopped: {}", e.message);
        std::process::exit(1);
    }
}

async fn run_demo(host: &RegisterHost) -> Result<(), ApiError> {
    let register = host.config.register_id.as_str();
    let products = host.catalog.list().await;
    if products.is_empty() {
        warn!("Catalog is empty; set seed_demo_catalog = true to run the demo");
        return Ok(());
    }

    for product in products {
        match cart::add_to_cart(&host.registers, &host.config, register, product.clone()).await {
            Ok(view) => info!(product = %product.name, total = %view.total_display, "Added"),
            Err(e) if e.code == ErrorCode::OutOfStock => {
                info!(product = %product.name, "Skipped: {}", e.message)
            }
            Err(e) => return Err(e),
        }
    }

    let view = cart::get_cart(&host.registers, &host.config, register).await;
    if let Some(first) = view.lines.first() {
        let product_id = first.product_id.clone();
        let view =
            cart::update_cart_item(&host.registers, &host.config, register, &product_id, 2).await?;
        info!(lines = view.totals.line_count, total = %view.total_display, "Cart ready");
    }

    host.orders.fail_next(FailPoint::Lines);
    match checkout::checkout(&host.registers, &host.config, register, "card").await {
        Err(e) if e.code == ErrorCode::PartialCommit => {
            warn!("{}", e.message);
            if let Some(order_id) = e.order_id.as_deref() {
                checkout::reconcile_partial_commit(&host.registers, register, order_id).await?;
                info!(order_id, "Orphaned order voided");
            }
        }
        Err(e) => return Err(e),
        Ok(receipt) => info!(order_id = %receipt.order_id, "Committed on first try"),
    }

    let receipt = checkout::checkout(&host.registers, &host.config, register, "card").await?;
    info!(
        store = %receipt.store_name,
        order_id = %receipt.order_id,
        total = %receipt.total_display,
        lines = receipt.line_count,
        "Sale complete"
    );

    let json = serde_json::to_string_pretty(&receipt)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    println!("{}", json);

    Ok(())
}

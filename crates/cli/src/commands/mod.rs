//! CLI command implementations.
//!
//! Results go to stdout; notices go to stderr.

pub mod cart;
pub mod products;
pub mod search;

use std::io::Write;

use qkart_core::Product;
use qkart_storefront::Notice;
use tokio::sync::mpsc::UnboundedReceiver;

/// Print every queued notice to stderr.
pub fn print_notices(notices: &mut UnboundedReceiver<Notice>) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    while let Ok(notice) = notices.try_recv() {
        writeln!(stderr, "{notice}")?;
    }
    Ok(())
}

/// Write a product table.
pub fn write_products(out: &mut impl Write, products: &[Product]) -> std::io::Result<()> {
    for product in products {
        writeln!(
            out,
            "{:<20} {:<32} {:<12} {:>8} {:>4.1}",
            product.id,
            product.name,
            product.category,
            product.cost,
            product.display_rating()
        )?;
    }
    Ok(())
}

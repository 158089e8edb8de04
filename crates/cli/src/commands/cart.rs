//! `qkart cart show|add|set`

use std::io::Write;

use qkart_core::ProductId;
use qkart_storefront::{BackendClient, Cart, CartError, Storefront};

use crate::CliError;

/// Print the cart with totals.
pub fn show(storefront: &Storefront<BackendClient>) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    if storefront.context().is_authenticated() {
        write_cart(&mut stdout, &storefront.cart().cart())?;
    } else {
        writeln!(stdout, "Not logged in")?;
    }
    Ok(())
}

/// Add one unit of a product.
pub async fn add(storefront: &Storefront<BackendClient>, product_id: &str) -> Result<(), CliError> {
    let outcome = storefront
        .cart()
        .add_to_cart(&ProductId::new(product_id))
        .await;
    settle(outcome)?;
    show(storefront)
}

/// Set the quantity of a product.
pub async fn set(
    storefront: &Storefront<BackendClient>,
    product_id: &str,
    quantity: u32,
) -> Result<(), CliError> {
    let outcome = storefront
        .cart()
        .set_quantity(&ProductId::new(product_id), quantity)
        .await;
    settle(outcome)?;
    show(storefront)
}

/// Keep only real failures.
///
/// Login required and already-in-cart are guidance: their notice has been
/// queued at warning level and the command still succeeds.
fn settle(outcome: Result<(), CartError>) -> Result<(), CartError> {
    match outcome {
        Err(CartError::AlreadyInCart(_) | CartError::Unauthenticated) => Ok(()),
        other => other,
    }
}

fn write_cart(out: &mut impl Write, cart: &Cart) -> std::io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty");
    }

    for item in cart.items() {
        writeln!(
            out,
            "{:<32} x{:<4} {:>8}",
            item.product.name,
            item.quantity,
            item.line_total()
        )?;
    }
    writeln!(out, "Items: {}", cart.total_items())?;
    writeln!(out, "Order total: {}", cart.total_cost())
}

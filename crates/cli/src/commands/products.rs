//! `qkart products`

use qkart_storefront::{BackendClient, Storefront};

use super::write_products;
use crate::CliError;

/// Print the catalog.
pub fn list(storefront: &Storefront<BackendClient>) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    write_products(&mut stdout, storefront.catalog().products())?;
    Ok(())
}

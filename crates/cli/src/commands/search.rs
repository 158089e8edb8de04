//! `qkart search`

use std::io::Write;
use std::time::Duration;

use qkart_storefront::{BackendClient, SearchPhase, Storefront};

use super::write_products;
use crate::CliError;

/// Search and print the resulting product list.
///
/// With `keystroke_ms` the text is fed one prefix at a time, as a user would
/// type it; only the final text is sent once typing pauses.
pub async fn run(
    storefront: &Storefront<BackendClient>,
    text: &str,
    keystroke_ms: Option<u64>,
) -> Result<(), CliError> {
    let search = storefront.search();
    let mut updates = search.subscribe();

    match keystroke_ms {
        Some(delay) => {
            let prefixes = text
                .char_indices()
                .skip(1)
                .filter_map(|(end, _)| text.get(..end));
            for prefix in prefixes {
                search.on_query_changed(prefix);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            search.on_query_changed(text);
        }
        None => search.on_query_changed(text),
    }

    let view = updates
        .wait_for(|view| {
            matches!(
                view.phase,
                SearchPhase::Idle
                    | SearchPhase::Results
                    | SearchPhase::NoMatches
                    | SearchPhase::Failed
            )
        })
        .await
        .map(|view| (*view).clone());

    let mut stdout = std::io::stdout().lock();
    match view {
        Ok(view) if view.phase == SearchPhase::NoMatches => {
            writeln!(stdout, "No products found")?;
        }
        Ok(view) => write_products(&mut stdout, &view.products)?,
        Err(_) => tracing::warn!("Search controller closed before a result arrived"),
    }

    Ok(())
}

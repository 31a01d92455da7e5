//! Enriched catalog - products joined with their categories.
//!
//! The join waits for both the product and the category fetch, then
//! recomputes the display fields every time either side emits.

use crate::{
    errors::{Error, Result},
    models::{Catalog, Category, Product, search_key_for},
    reactive::{ErrorChannel, SharedStream, TaskRegistry},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Joins raw products with categories.
///
/// Every derived field is rebuilt from the source record: `category` from the
/// category list, `search_key` from the name, and `price` as the source price
/// times `markup`.
///
/// # Errors
/// Returns `Error::UnknownCategory` if any product references a category that
/// is not in `categories`.
pub fn enrich(products: &[Product], categories: &[Category], markup: f64) -> Result<Vec<Product>> {
    let names: HashMap<i64, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_str()))
        .collect();

    products
        .iter()
        .map(|product| -> Result<Product> {
            let category = names
                .get(&product.category_id)
                .ok_or(Error::UnknownCategory {
                    product_id: product.id,
                    category_id: product.category_id,
                })?;
            Ok(Product {
                price: product.price * markup,
                category: Some((*category).to_string()),
                search_key: search_key_for(&product.product_name),
                ..product.clone()
            })
        })
        .collect()
}

/// Combine-latest of the two fetchers, mapped through [`enrich`].
///
/// A join-integrity failure is reported to the error channel and ends the
/// stream. If either fetcher completes without data, the join can never
/// produce anything and ends quietly.
pub fn enriched_catalog(
    products: SharedStream<Vec<Product>>,
    categories: SharedStream<Vec<Category>>,
    markup: f64,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
    errors: ErrorChannel,
) -> SharedStream<Catalog> {
    SharedStream::new("enriched_catalog", capacity, tasks, move |output| async move {
        let mut product_updates = products.subscribe();
        let mut category_updates = categories.subscribe();
        let mut latest_products: Option<Vec<Product>> = None;
        let mut latest_categories: Option<Vec<Category>> = None;
        let mut products_open = true;
        let mut categories_open = true;

        loop {
            tokio::select! {
                next = product_updates.next(), if products_open => match next {
                    Some(list) => latest_products = Some(list),
                    None => {
                        products_open = false;
                        if latest_products.is_none() {
                            debug!("Products completed without data; enriched catalog ends");
                            break;
                        }
                        continue;
                    }
                },
                next = category_updates.next(), if categories_open => match next {
                    Some(list) => latest_categories = Some(list),
                    None => {
                        categories_open = false;
                        if latest_categories.is_none() {
                            debug!("Categories completed without data; enriched catalog ends");
                            break;
                        }
                        continue;
                    }
                },
                else => break,
            }

            let (Some(products), Some(categories)) = (&latest_products, &latest_categories) else {
                continue;
            };
            match enrich(products, categories, markup) {
                Ok(enriched) => {
                    info!("Enriched catalog computed with {} products.", enriched.len());
                    output.publish(Arc::new(enriched));
                }
                Err(e) => {
                    errors.report("Unable to enrich the catalog", &e);
                    break;
                }
            }
        }
    })
}

//! Supplier detail for the selected product, switch-to-latest.
//!
//! At most one supplier batch is in flight. A new selection drops the pending
//! batch, which cancels every one of its sub-fetches, so results for a
//! superseded selection can never be published.

use crate::{
    errors::Result,
    models::{Product, Supplier, SupplierDetail},
    reactive::{ErrorChannel, SharedStream, TaskRegistry},
    source::CatalogSource,
};
use futures::future::{BoxFuture, FutureExt, OptionFuture, try_join_all};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Fetches every supplier concurrently, keeping `supplier_ids` order.
///
/// # Errors
/// Returns the first failure among the sub-fetches.
pub async fn fetch_suppliers(
    source: Arc<dyn CatalogSource>,
    supplier_ids: Vec<i64>,
) -> Result<Vec<Supplier>> {
    try_join_all(supplier_ids.iter().map(|&id| source.fetch_supplier(id))).await
}

struct InFlight {
    generation: u64,
    product_id: i64,
    batch: BoxFuture<'static, Result<Vec<Supplier>>>,
}

/// Identity of a selection for repeat detection.
fn selection_key(selected: Option<&Product>) -> Option<(i64, Vec<i64>)> {
    selected.map(|product| (product.id, product.supplier_ids.clone()))
}

pub fn supplier_detail(
    selection: SharedStream<Option<Product>>,
    source: Arc<dyn CatalogSource>,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
    errors: ErrorChannel,
) -> SharedStream<SupplierDetail> {
    SharedStream::new("supplier_detail", capacity, tasks, move |output| async move {
        let mut selections = selection.subscribe();
        let mut selections_open = true;
        let mut last_key: Option<Option<(i64, Vec<i64>)>> = None;
        let mut generation: u64 = 0;
        let mut in_flight: Option<InFlight> = None;

        loop {
            tokio::select! {
                next = selections.next(), if selections_open => {
                    let Some(selected) = next else {
                        selections_open = false;
                        continue;
                    };
                    let key = selection_key(selected.as_ref());
                    if last_key.as_ref() == Some(&key) {
                        trace!("Selection unchanged; keeping current supplier detail");
                        continue;
                    }
                    last_key = Some(key);
                    let Some(product) = selected else {
                        continue;
                    };

                    if let Some(stale) = in_flight.take() {
                        debug!(
                            generation = stale.generation,
                            product_id = stale.product_id,
                            "Selection changed; cancelling supplier fetch"
                        );
                    }
                    generation += 1;
                    info!(
                        generation,
                        product_id = product.id,
                        "Fetching {} suppliers...",
                        product.supplier_ids.len()
                    );
                    in_flight = Some(InFlight {
                        generation,
                        product_id: product.id,
                        batch: fetch_suppliers(Arc::clone(&source), product.supplier_ids).boxed(),
                    });
                }
                Some(result) = OptionFuture::from(in_flight.as_mut().map(|flight| &mut flight.batch)) => {
                    let Some(done) = in_flight.take() else {
                        continue;
                    };
                    match result {
                        Ok(suppliers) => {
                            info!(
                                generation = done.generation,
                                product_id = done.product_id,
                                "Supplier detail ready with {} suppliers.",
                                suppliers.len()
                            );
                            output.publish(SupplierDetail {
                                product_id: done.product_id,
                                suppliers,
                            });
                        }
                        Err(e) => {
                            errors.report(
                                &format!("Unable to load suppliers for product {}", done.product_id),
                                &e,
                            );
                            // Selecting the same product again retries.
                            last_key = None;
                        }
                    }
                }
                else => break,
            }
        }
    })
}

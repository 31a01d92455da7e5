//! Filtered view and product selection.
//!
//! Both are joins of the accumulating catalog with one selection cell,
//! recomputed whenever either side changes.

use crate::{
    models::{Catalog, NO_SELECTION, Product},
    reactive::{SharedStream, StateCell, TaskRegistry},
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Products visible under `category_id`; the sentinel passes everything.
#[must_use]
pub fn filter_by_category(catalog: &Catalog, category_id: i64) -> Catalog {
    if category_id == NO_SELECTION {
        return Arc::clone(catalog);
    }
    Arc::new(
        catalog
            .iter()
            .filter(|product| product.category_id == category_id)
            .cloned()
            .collect(),
    )
}

/// The product with `product_id`, or `None`. The sentinel never matches.
#[must_use]
pub fn find_product(catalog: &Catalog, product_id: i64) -> Option<Product> {
    if product_id == NO_SELECTION {
        return None;
    }
    catalog.iter().find(|product| product.id == product_id).cloned()
}

/// Combine-latest of `catalog` and `selection`, projected through `project`.
pub fn join_with_selection<R, P>(
    name: &'static str,
    catalog: SharedStream<Catalog>,
    selection: StateCell<i64>,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
    project: P,
) -> SharedStream<R>
where
    R: Clone + Send + 'static,
    P: Fn(&Catalog, i64) -> R + Send + 'static,
{
    SharedStream::new(name, capacity, tasks, move |output| async move {
        let mut catalog_updates = catalog.subscribe();
        let mut selection_updates = selection.stream();
        let mut latest_catalog: Option<Catalog> = None;
        let mut latest_selection: Option<i64> = None;
        let mut catalog_open = true;
        let mut selection_open = true;

        loop {
            tokio::select! {
                next = catalog_updates.next(), if catalog_open => match next {
                    Some(list) => latest_catalog = Some(list),
                    None => {
                        catalog_open = false;
                        if latest_catalog.is_none() {
                            debug!(stream = name, "Catalog ended without data");
                            break;
                        }
                        continue;
                    }
                },
                next = selection_updates.next(), if selection_open => match next {
                    Some(id) => latest_selection = Some(id),
                    None => {
                        selection_open = false;
                        continue;
                    }
                },
                else => break,
            }

            if let (Some(list), Some(id)) = (&latest_catalog, latest_selection) {
                trace!(stream = name, selection = id, products = list.len(), "Recomputing join");
                output.publish(project(list, id));
            }
        }
    })
}

/// The currently visible subset of the catalog.
pub fn filtered_catalog(
    catalog: SharedStream<Catalog>,
    category_filter: StateCell<i64>,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
) -> SharedStream<Catalog> {
    join_with_selection(
        "filtered_catalog",
        catalog,
        category_filter,
        capacity,
        tasks,
        filter_by_category,
    )
}

/// The currently selected product.
pub fn selected_product(
    catalog: SharedStream<Catalog>,
    product_selection: StateCell<i64>,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
) -> SharedStream<Option<Product>> {
    join_with_selection(
        "selected_product",
        catalog,
        product_selection,
        capacity,
        tasks,
        find_product,
    )
}

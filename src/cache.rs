//! Fetch-once catalog caches.
//!
//! Each fetcher is a [`SharedStream`] whose task performs a single request on
//! first subscription. A success is published and replayed to everyone
//! forever; a failure goes to the error channel and the stream completes
//! empty.

use crate::errors::Result;
use crate::models::{Category, Product};
use crate::reactive::{ErrorChannel, SharedStream, TaskRegistry};
use crate::source::CatalogSource;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Builds a cached stream around a one-shot fetch.
pub fn cached_fetch<T, F, Fut>(
    resource: &'static str,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
    errors: ErrorChannel,
    fetch: F,
) -> SharedStream<T>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    SharedStream::new(resource, capacity, tasks, move |output| async move {
        info!("Fetching {resource}...");
        match fetch().await {
            Ok(value) => {
                info!("{resource} fetched and cached.");
                output.publish(value);
            }
            Err(e) => errors.report(&format!("Unable to load {resource}"), &e),
        }
    })
}

/// Cached raw product list.
pub fn product_catalog(
    source: Arc<dyn CatalogSource>,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
    errors: ErrorChannel,
) -> SharedStream<Vec<Product>> {
    cached_fetch("products", capacity, tasks, errors, move || async move {
        source.fetch_products().await
    })
}

/// Cached category list.
pub fn category_catalog(
    source: Arc<dyn CatalogSource>,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
    errors: ErrorChannel,
) -> SharedStream<Vec<Category>> {
    cached_fetch("categories", capacity, tasks, errors, move || async move {
        source.fetch_categories().await
    })
}

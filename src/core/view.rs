//! Catalog view session - owns the action channels and wires every stream.
//!
//! Nothing is fetched until a consumer subscribes to a stream that needs the
//! catalog. Dropping the view, or calling [`CatalogView::shutdown`], aborts
//! every background task and completes all streams.

use crate::{
    cache::{category_catalog, product_catalog},
    config::view::ViewConfig,
    core::{
        accumulate::accumulating_catalog,
        enrich::enriched_catalog,
        selection::{filtered_catalog, selected_product},
        supplier::supplier_detail,
    },
    models::{Catalog, Category, NO_SELECTION, Product, SupplierDetail},
    reactive::{
        ErrorChannel, ErrorMessage, EventEmitter, SharedStream, StateCell, Subscription,
        TaskRegistry,
    },
    source::CatalogSource,
};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CatalogView {
    category_filter: StateCell<i64>,
    product_selection: StateCell<i64>,
    insertions: EventEmitter<Product>,
    errors: ErrorChannel,
    products: SharedStream<Vec<Product>>,
    categories: SharedStream<Vec<Category>>,
    enriched: SharedStream<Catalog>,
    catalog: SharedStream<Catalog>,
    filtered: SharedStream<Catalog>,
    selected: SharedStream<Option<Product>>,
    suppliers: SharedStream<SupplierDetail>,
    tasks: Arc<TaskRegistry>,
}

impl CatalogView {
    /// Creates a view session over `source`.
    ///
    /// Insertions are captured from this point on, even before any stream
    /// has a subscriber.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, config: &ViewConfig) -> Self {
        let capacity = config.channel_capacity;
        let tasks = Arc::new(TaskRegistry::new());
        let errors = ErrorChannel::new();
        let category_filter = StateCell::new(NO_SELECTION);
        let product_selection = StateCell::new(NO_SELECTION);
        let insertions = EventEmitter::new();

        let products = product_catalog(Arc::clone(&source), capacity, &tasks, errors.clone());
        let categories = category_catalog(Arc::clone(&source), capacity, &tasks, errors.clone());
        let enriched = enriched_catalog(
            products.clone(),
            categories.clone(),
            config.markup,
            capacity,
            &tasks,
            errors.clone(),
        );
        let catalog = accumulating_catalog(enriched.clone(), insertions.stream(), capacity, &tasks);
        let filtered = filtered_catalog(catalog.clone(), category_filter.clone(), capacity, &tasks);
        let selected = selected_product(catalog.clone(), product_selection.clone(), capacity, &tasks);
        let suppliers = supplier_detail(selected.clone(), source, capacity, &tasks, errors.clone());

        debug!(markup = config.markup, capacity, "Catalog view session created");
        Self {
            category_filter,
            product_selection,
            insertions,
            errors,
            products,
            categories,
            enriched,
            catalog,
            filtered,
            selected,
            suppliers,
            tasks,
        }
    }

    /// Filters the visible catalog to one category; `0` clears the filter.
    pub fn set_category_filter(&self, category_id: i64) {
        info!(category_id, "Category filter changed");
        self.category_filter.set(category_id);
    }

    /// Selects a product by id; `0` clears the selection.
    pub fn set_selected_product(&self, product_id: i64) {
        info!(product_id, "Product selection changed");
        self.product_selection.set(product_id);
    }

    /// Appends a product to the catalog, or the placeholder product when `None`.
    pub fn insert_product(&self, product: Option<Product>) {
        let product = product.unwrap_or_else(Product::placeholder);
        info!(product_id = product.id, "Inserting product");
        self.insertions.emit(product);
    }

    #[must_use]
    pub fn selected_category_id(&self) -> i64 {
        self.category_filter.get()
    }

    #[must_use]
    pub fn selected_product_id(&self) -> i64 {
        self.product_selection.get()
    }

    /// Raw products, fetched once.
    #[must_use]
    pub fn product_catalog(&self) -> Subscription<Vec<Product>> {
        self.products.subscribe()
    }

    /// Categories, fetched once.
    #[must_use]
    pub fn category_catalog(&self) -> Subscription<Vec<Category>> {
        self.categories.subscribe()
    }

    /// Products joined with category names and marked-up prices.
    #[must_use]
    pub fn enriched_catalog(&self) -> Subscription<Catalog> {
        self.enriched.subscribe()
    }

    /// The enriched catalog plus every insertion, growing by one per insert.
    #[must_use]
    pub fn catalog(&self) -> Subscription<Catalog> {
        self.catalog.subscribe()
    }

    /// The catalog under the current category filter.
    #[must_use]
    pub fn filtered_catalog(&self) -> Subscription<Catalog> {
        self.filtered.subscribe()
    }

    /// The currently selected product, or `None`.
    #[must_use]
    pub fn selected_product(&self) -> Subscription<Option<Product>> {
        self.selected.subscribe()
    }

    /// Suppliers for the most recent selection.
    #[must_use]
    pub fn supplier_detail(&self) -> Subscription<SupplierDetail> {
        self.suppliers.subscribe()
    }

    /// Every failure raised so far, then live failures.
    #[must_use]
    pub fn error_messages(&self) -> Subscription<ErrorMessage> {
        self.errors.subscribe()
    }

    #[must_use]
    pub const fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Ends the session: aborts every task and completes every stream.
    pub fn shutdown(&self) {
        if !self.tasks.is_shut_down() {
            info!("Shutting down catalog view session");
            self.tasks.shutdown();
        }
    }
}

impl Drop for CatalogView {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{
        FakeCatalogSource, init_test_tracing, next_within, raw_product, sample_suppliers,
    };
    use std::collections::HashSet;

    fn toolbox_view() -> (Arc<FakeCatalogSource>, CatalogView) {
        let source = Arc::new(FakeCatalogSource::new(
            vec![raw_product(1, "Hammer", 3, 10.0)],
            vec![Category {
                id: 3,
                name: "Toolbox".to_string(),
            }],
        ));
        let view = CatalogView::new(source.clone(), &ViewConfig::default());
        (source, view)
    }

    #[tokio::test]
    async fn test_toolbox_scenario() {
        init_test_tracing();
        let (_source, view) = toolbox_view();

        let mut enriched = view.enriched_catalog();
        let list = next_within(&mut enriched).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 1);
        assert_eq!(list[0].category.as_deref(), Some("Toolbox"));
        assert_eq!(list[0].price, 15.0);

        let mut filtered = view.filtered_catalog();
        assert_eq!(next_within(&mut filtered).await.map(|c| c.len()), Some(1));

        let mut catalog = view.catalog();
        assert_eq!(next_within(&mut catalog).await.map(|c| c.len()), Some(1));

        view.insert_product(None);
        let grown = next_within(&mut catalog).await.unwrap();
        assert_eq!(grown.len(), 2);
        assert_eq!(grown[1].id, 42);
        assert_eq!(grown[1].price, 8.9);
        assert_eq!(next_within(&mut filtered).await.map(|c| c.len()), Some(2));

        view.set_category_filter(3);
        assert_eq!(next_within(&mut filtered).await.map(|c| c.len()), Some(2));

        view.set_category_filter(9);
        assert_eq!(next_within(&mut filtered).await.map(|c| c.len()), Some(0));
        assert_eq!(view.selected_category_id(), 9);
        assert!(view.errors().is_empty());
    }

    /// Reads until a list of `len` products arrives; a lagging reader may skip
    /// intermediate lists but always reaches the newest one.
    async fn catalog_of_len(catalog: &mut Subscription<Catalog>, len: usize) -> Option<Catalog> {
        while let Some(list) = next_within(catalog).await {
            if list.len() == len {
                return Some(list);
            }
        }
        None
    }

    #[tokio::test]
    async fn test_insertion_bursts_beyond_capacity_are_kept() {
        init_test_tracing();
        let source = Arc::new(FakeCatalogSource::sample());
        let base = source.products().len();
        let view = CatalogView::new(source.clone(), &ViewConfig::default());
        let burst = ViewConfig::default().channel_capacity + 44;

        for n in 0..burst {
            view.insert_product(Some(raw_product(1000 + n as i64, "Early", 3, 1.0)));
        }
        let mut catalog = view.catalog();
        let loaded = catalog_of_len(&mut catalog, base + burst).await.unwrap();
        assert_eq!(loaded.iter().filter(|p| p.id >= 1000).count(), burst);

        for n in 0..burst {
            view.insert_product(Some(raw_product(5000 + n as i64, "Late", 3, 1.0)));
        }
        let grown = catalog_of_len(&mut catalog, base + 2 * burst).await.unwrap();
        let ids: HashSet<i64> = grown.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), base + 2 * burst);
        assert!(ids.contains(&1000) && ids.contains(&(5000 + burst as i64 - 1)));
        assert!(view.errors().is_empty());
    }

    #[tokio::test]
    async fn test_resubscribing_never_refetches() {
        init_test_tracing();
        let (source, view) = toolbox_view();

        let mut first = view.enriched_catalog();
        next_within(&mut first).await.unwrap();
        let mut filtered = view.filtered_catalog();
        next_within(&mut filtered).await.unwrap();
        let mut second = view.enriched_catalog();
        next_within(&mut second).await.unwrap();
        let mut products = view.product_catalog();
        next_within(&mut products).await.unwrap();

        assert_eq!(source.product_calls(), 1);
        assert_eq!(source.category_calls(), 1);
    }

    #[tokio::test]
    async fn test_accumulation_is_monotonic() {
        init_test_tracing();
        let view = CatalogView::new(Arc::new(FakeCatalogSource::sample()), &ViewConfig::default());
        let mut catalog = view.catalog();
        let mut previous = next_within(&mut catalog).await.unwrap();

        for id in 100..105 {
            view.insert_product(Some(raw_product(id, "Inserted", 5, 1.0)));
            let next = next_within(&mut catalog).await.unwrap();
            let before: HashSet<i64> = previous.iter().map(|p| p.id).collect();
            let after: HashSet<i64> = next.iter().map(|p| p.id).collect();
            assert_eq!(next.len(), previous.len() + 1);
            assert!(after.is_superset(&before));
            assert!(after.contains(&id));
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_insertion_before_load_is_not_dropped() {
        init_test_tracing();
        let view = CatalogView::new(Arc::new(FakeCatalogSource::sample()), &ViewConfig::default());
        view.insert_product(None);

        let mut catalog = view.catalog();
        let seed = next_within(&mut catalog).await.unwrap();
        assert!(seed.iter().all(|p| p.id != 42));
        let with_insert = next_within(&mut catalog).await.unwrap();
        assert_eq!(with_insert.len(), seed.len() + 1);
        assert_eq!(with_insert.last().map(|p| p.id), Some(42));
    }

    #[tokio::test]
    async fn test_selection_sentinel_yields_none() {
        init_test_tracing();
        let mut products = FakeCatalogSource::sample().products().to_vec();
        products.push(raw_product(0, "Zero", 1, 1.0));
        let source = FakeCatalogSource::sample().with_products(products);
        let view = CatalogView::new(Arc::new(source), &ViewConfig::default());

        let mut selected = view.selected_product();
        assert_eq!(next_within(&mut selected).await, Some(None));

        view.set_selected_product(5);
        assert_eq!(next_within(&mut selected).await.flatten().map(|p| p.id), Some(5));

        view.set_selected_product(0);
        assert_eq!(next_within(&mut selected).await, Some(None));
        assert_eq!(view.selected_product_id(), 0);
    }

    #[tokio::test]
    async fn test_supplier_detail_follows_selection() {
        init_test_tracing();
        let view = CatalogView::new(Arc::new(FakeCatalogSource::sample()), &ViewConfig::default());
        let mut detail = view.supplier_detail();

        view.set_selected_product(5);
        let received = next_within(&mut detail).await.unwrap();
        assert_eq!(received.product_id, 5);
        let expected: Vec<i64> = sample_suppliers()
            .into_iter()
            .filter(|s| s.id == 4 || s.id == 5)
            .map(|s| s.id)
            .collect();
        assert_eq!(
            received.suppliers.iter().map(|s| s.id).collect::<Vec<_>>(),
            expected
        );
    }

    #[tokio::test]
    async fn test_category_failure_is_isolated() {
        init_test_tracing();
        let source = Arc::new(FakeCatalogSource::sample().failing_categories());
        let view = CatalogView::new(source.clone(), &ViewConfig::default());

        let mut filtered = view.filtered_catalog();
        let mut catalog = view.catalog();
        assert_eq!(next_within(&mut filtered).await, None);
        assert_eq!(next_within(&mut catalog).await, None);

        assert_eq!(view.errors().len(), 1);
        let message = view.errors().latest().map(|m| m.message).unwrap_or_default();
        assert!(message.contains("categories"), "{message}");
        assert_eq!(source.product_calls(), 1);

        let mut products = view.product_catalog();
        assert_eq!(next_within(&mut products).await.map(|p| p.len()), Some(4));
    }

    #[tokio::test]
    async fn test_product_failure_leaves_categories_usable() {
        init_test_tracing();
        let source = Arc::new(FakeCatalogSource::sample().failing_products());
        let view = CatalogView::new(source.clone(), &ViewConfig::default());

        let mut enriched = view.enriched_catalog();
        assert_eq!(next_within(&mut enriched).await, None);

        let mut categories = view.category_catalog();
        assert_eq!(next_within(&mut categories).await.map(|c| c.len()), Some(3));

        let mut errors = view.error_messages();
        let reported = next_within(&mut errors).await.map(|m| m.message);
        assert!(reported.is_some_and(|m| m.contains("products")));
        assert_eq!(view.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_completes_streams() {
        init_test_tracing();
        let view = CatalogView::new(Arc::new(FakeCatalogSource::sample()), &ViewConfig::default());
        let mut catalog = view.catalog();
        next_within(&mut catalog).await.unwrap();

        view.shutdown();
        tokio::task::yield_now().await;
        view.insert_product(None);
        assert_eq!(next_within(&mut catalog).await, None);
    }
}

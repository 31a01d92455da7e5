//! Accumulating catalog - the enriched catalog plus every local insertion.
//!
//! The enriched catalog seeds the fold; each inserted product is appended and
//! the new list published. Insertions that arrive before the seed are held
//! back and folded, in order, right after it.

use crate::{
    models::{Catalog, Product},
    reactive::{SharedStream, Subscription, TaskRegistry},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fold state behind the accumulating catalog.
#[derive(Debug, Default)]
pub struct CatalogFold {
    current: Option<Vec<Product>>,
    inserted: Vec<Product>,
    pending: Vec<Product>,
}

impl CatalogFold {
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.current.is_some()
    }

    /// Number of insertions waiting for the seed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies a catalog emission and returns the lists to publish, in order.
    ///
    /// The first seed yields the seed itself followed by one list per buffered
    /// insertion. A later seed replaces the base and re-applies every
    /// insertion seen so far.
    pub fn seed(&mut self, catalog: &Catalog) -> Vec<Catalog> {
        if self.current.is_some() {
            let mut list = catalog.to_vec();
            list.extend(self.inserted.iter().cloned());
            debug!("Catalog re-seeded; {} insertions re-applied", self.inserted.len());
            let snapshot = Arc::new(list.clone());
            self.current = Some(list);
            return vec![snapshot];
        }

        let mut list = catalog.to_vec();
        let mut emissions = vec![Arc::new(list.clone())];
        for product in std::mem::take(&mut self.pending) {
            debug!(product_id = product.id, "Folding buffered insertion");
            list.push(product.clone());
            self.inserted.push(product);
            emissions.push(Arc::new(list.clone()));
        }
        self.current = Some(list);
        emissions
    }

    /// Applies an insertion. Returns the new list, or `None` while the fold is
    /// still waiting for its seed.
    pub fn insert(&mut self, product: Product) -> Option<Catalog> {
        let Some(list) = self.current.as_mut() else {
            debug!(product_id = product.id, "Catalog not loaded yet; buffering insertion");
            self.pending.push(product);
            return None;
        };
        list.push(product.clone());
        self.inserted.push(product);
        Some(Arc::new(list.clone()))
    }
}

/// Merges the enriched catalog with the insertion events through a [`CatalogFold`].
///
/// `insertions` is subscribed by the caller up front so that nothing inserted
/// before the first subscriber arrives is lost.
pub fn accumulating_catalog(
    enriched: SharedStream<Catalog>,
    insertions: Subscription<Product>,
    capacity: usize,
    tasks: &Arc<TaskRegistry>,
) -> SharedStream<Catalog> {
    SharedStream::new("catalog", capacity, tasks, move |output| async move {
        let mut insertions = insertions;
        let mut seeds = enriched.subscribe();
        let mut fold = CatalogFold::default();
        let mut seeds_open = true;
        let mut insertions_open = true;

        loop {
            tokio::select! {
                next = seeds.next(), if seeds_open => match next {
                    Some(catalog) => {
                        for list in fold.seed(&catalog) {
                            output.publish(list);
                        }
                    }
                    None => {
                        seeds_open = false;
                        if !fold.is_seeded() {
                            warn!(
                                "Enriched catalog ended without data; dropping {} buffered insertions",
                                fold.pending()
                            );
                            break;
                        }
                    }
                },
                next = insertions.next(), if insertions_open => match next {
                    Some(product) => {
                        if let Some(list) = fold.insert(product) {
                            info!("Catalog now holds {} products.", list.len());
                            output.publish(list);
                        }
                    }
                    None => insertions_open = false,
                },
                else => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::reactive::{DEFAULT_CAPACITY, EventEmitter, ReplayCell};
    use crate::test_utils::{init_test_tracing, next_within, raw_product};
    use std::collections::HashSet;

    fn ids(catalog: &Catalog) -> HashSet<i64> {
        catalog.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_fold_buffers_insertions_until_seeded() {
        let mut fold = CatalogFold::default();
        assert!(fold.insert(raw_product(42, "Early", 3, 1.0)).is_none());
        assert_eq!(fold.pending(), 1);

        let seed = Arc::new(vec![raw_product(1, "Seed", 3, 1.0)]);
        let emissions = fold.seed(&seed);
        assert_eq!(emissions.len(), 2);
        assert_eq!(emissions[0].len(), 1);
        assert_eq!(ids(&emissions[1]), HashSet::from([1, 42]));
        assert_eq!(fold.pending(), 0);
    }

    #[test]
    fn test_fold_grows_by_one_per_insertion() {
        let mut fold = CatalogFold::default();
        let mut previous = fold.seed(&Arc::new(vec![raw_product(1, "Seed", 3, 1.0)]))[0].clone();
        for id in 10..15 {
            let next = fold.insert(raw_product(id, "Inserted", 3, 1.0)).unwrap();
            assert_eq!(next.len(), previous.len() + 1);
            assert!(ids(&next).is_superset(&ids(&previous)));
            previous = next;
        }
    }

    #[test]
    fn test_reseed_keeps_insertions() {
        let mut fold = CatalogFold::default();
        fold.seed(&Arc::new(vec![raw_product(1, "Seed", 3, 1.0)]));
        fold.insert(raw_product(42, "Inserted", 3, 1.0));

        let emissions = fold.seed(&Arc::new(vec![raw_product(2, "Fresh", 3, 1.0)]));
        assert_eq!(emissions.len(), 1);
        assert_eq!(ids(&emissions[0]), HashSet::from([2, 42]));
    }

    #[tokio::test]
    async fn test_stream_folds_early_and_late_insertions() {
        init_test_tracing();
        let tasks = Arc::new(TaskRegistry::new());
        let insertions = EventEmitter::new();
        let (seed_tx, seed_rx) = tokio::sync::oneshot::channel::<Catalog>();
        let enriched = SharedStream::new(
            "seed",
            DEFAULT_CAPACITY,
            &tasks,
            move |output: ReplayCell<Catalog>| async move {
                if let Ok(seed) = seed_rx.await {
                    output.publish(seed);
                }
            },
        );
        let catalog = accumulating_catalog(enriched, insertions.stream(), DEFAULT_CAPACITY, &tasks);

        // Inserted before anybody subscribed and before the seed exists.
        insertions.emit(raw_product(42, "Early", 3, 1.0));
        let mut subscription = catalog.subscribe();
        seed_tx
            .send(Arc::new(vec![raw_product(1, "Seed", 3, 1.0)]))
            .unwrap();

        let first = next_within(&mut subscription).await.unwrap();
        assert_eq!(ids(&first), HashSet::from([1]));
        let second = next_within(&mut subscription).await.unwrap();
        assert_eq!(ids(&second), HashSet::from([1, 42]));

        insertions.emit(raw_product(43, "Late", 3, 1.0));
        let third = next_within(&mut subscription).await.unwrap();
        assert_eq!(third.len(), 3);
    }

    #[tokio::test]
    async fn test_stream_ends_when_seed_never_arrives() {
        init_test_tracing();
        let tasks = Arc::new(TaskRegistry::new());
        let insertions = EventEmitter::new();
        let enriched: SharedStream<Catalog> =
            SharedStream::new("empty", DEFAULT_CAPACITY, &tasks, |_output| async {});
        let catalog = accumulating_catalog(enriched, insertions.stream(), DEFAULT_CAPACITY, &tasks);

        insertions.emit(raw_product(42, "Orphan", 3, 1.0));
        let mut subscription = catalog.subscribe();
        assert_eq!(next_within(&mut subscription).await, None);
    }
}

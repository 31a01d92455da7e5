use catalog_view::{
    config::{
        database::{create_connection, create_tables, seed_catalog},
        seed::load_seed,
        view::load_default_config,
    },
    core::CatalogView,
    errors::Result,
    models::{Catalog, NO_SELECTION},
    reactive::Subscription,
    source::DatabaseCatalogSource,
};
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long the scripted session waits for a derived value before moving on.
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

async fn next_step<T: Clone>(label: &str, subscription: &mut Subscription<T>) -> Option<T> {
    match tokio::time::timeout(STEP_TIMEOUT, subscription.next()).await {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            warn!("{label}: stream completed without a value");
            None
        }
        Err(_) => {
            warn!("{label}: no value within {STEP_TIMEOUT:?}");
            None
        }
    }
}

fn log_catalog(label: &str, catalog: &Catalog) {
    info!("{label}: {} products", catalog.len());
    for product in catalog.iter() {
        info!(
            "  #{} {} [{}] {:.2} ({})",
            product.id,
            product.product_name,
            product.product_code,
            product.price,
            product.category.as_deref().unwrap_or("uncategorized")
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!("Successfully processed application configuration.");

    // 4. Initialize and seed the catalog database
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db).await?;
    let seed = load_seed(&app_config.seed.path)?;
    seed_catalog(&db, &seed)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;

    // 5. Open the view session and drive it
    let view = CatalogView::new(Arc::new(DatabaseCatalogSource::new(db)), &app_config.view);
    let mut filtered = view.filtered_catalog();
    let mut selected = view.selected_product();
    let mut suppliers = view.supplier_detail();

    if let Some(catalog) = next_step("Catalog", &mut filtered).await {
        log_catalog("Catalog", &catalog);

        let first_category = catalog.first().map_or(NO_SELECTION, |p| p.category_id);
        view.set_category_filter(first_category);
        if let Some(catalog) = next_step("Filtered", &mut filtered).await {
            log_catalog(&format!("Category {first_category}"), &catalog);
        }

        if let Some(product) = catalog.first() {
            view.set_selected_product(product.id);
            // The first selection value is the initial "nothing selected".
            while let Some(selection) = next_step("Selection", &mut selected).await {
                if let Some(product) = selection {
                    info!("Selected: {} ({})", product.product_name, product.id);
                    break;
                }
            }
            if let Some(detail) = next_step("Suppliers", &mut suppliers).await {
                info!("Suppliers for product {}:", detail.product_id);
                for supplier in &detail.suppliers {
                    info!(
                        "  {} <{}> {:.2}/unit, min {}",
                        supplier.company_name,
                        supplier.email,
                        supplier.cost_per_unit,
                        supplier.minimum_quantity
                    );
                }
            }
        }

        view.set_category_filter(NO_SELECTION);
        view.insert_product(None);
        // Filter reset and insertion can land as one or two updates.
        while let Some(catalog) = next_step("Filtered", &mut filtered).await {
            let done = catalog.iter().any(|p| p.id == 42);
            if done {
                log_catalog("After insert", &catalog);
                break;
            }
        }
    }

    view.shutdown();
    for message in view.errors().history() {
        warn!("Reported error at {}: {}", message.raised_at, message);
    }
    Ok(())
}

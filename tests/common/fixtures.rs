//! Product fixtures and storefront builders

use std::sync::Arc;

use luxemarket::client::config::Config;
use luxemarket::client::notify::ChannelNotifier;
use luxemarket::client::offline::OperationDispatcher;
use luxemarket::client::Storefront;
use luxemarket::shared::{AppConfig, Product, Rating};
use rust_decimal::Decimal;

pub fn product(id: u64, title: &str, price: Decimal) -> Product {
    Product {
        id,
        title: title.to_string(),
        price,
        description: format!("{} description", title),
        category: "electronics".to_string(),
        image: format!("https://img.example/{}.jpg", id),
        rating: Some(Rating { rate: 4.2, count: 120 }),
    }
}

/// Catalog JSON in the shape the product API returns
pub fn catalog_json(products: &[Product]) -> serde_json::Value {
    serde_json::to_value(products).expect("products serialize")
}

/// Storefront persisting under `dir`, with a notifier tests can subscribe to
pub async fn storefront_in(
    dir: &std::path::Path,
    dispatcher: Option<Arc<dyn OperationDispatcher>>,
) -> (Storefront, ChannelNotifier) {
    let config = Config::with_builder(AppConfig::builder().storage_dir(dir)).expect("valid config");
    let notifier = ChannelNotifier::new(64);
    let storefront = Storefront::open_with(&config, Arc::new(notifier.clone()), dispatcher)
        .await
        .expect("storefront opens");
    (storefront, notifier)
}

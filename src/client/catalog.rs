//! # Catalog Client
//!
//! Read-only access to the product catalog API.
//!
//! ## Features
//!
//! - **Response Cache**: Responses are reused until the revalidation interval
//!   (one hour by default) elapses
//! - **Degraded Results**: Transport, status and decoding failures are logged
//!   and surface as an empty list or `None`
//! - **Client-side Filters**: Price range, minimum rating and sort order are
//!   applied locally since the API does not support them
//!
//! ## Usage
//!
//! ```rust,no_run
//! use luxemarket::client::catalog::{CatalogClient, ProductQuery, SortOrder};
//! use luxemarket::client::config::Config;
//!
//! # async fn example() {
//! let catalog = CatalogClient::new(&Config::new());
//! let query = ProductQuery::default().category("electronics").sort(SortOrder::PriceAsc);
//! let products = catalog.products(&query).await;
//! # }
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::client::config::Config;
use crate::shared::Product;

/// Number of products shown as featured
pub const FEATURED_LIMIT: usize = 4;

/// Maximum related products returned
pub const RELATED_LIMIT: usize = 4;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Request failed with status {0}")]
    Status(u16),
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid catalog URL: {0}")]
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    /// Highest rated first
    Rating,
    /// The API has no dates; the listing order is reversed instead
    Newest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            "rating" => Ok(SortOrder::Rating),
            "newest" => Ok(SortOrder::Newest),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Listing filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Minimum rating after rounding to the nearest star
    pub rating: Option<u32>,
    pub sort: Option<SortOrder>,
}

impl ProductQuery {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn min_rating(mut self, rating: u32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Filter and sort an already fetched listing
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut products: Vec<Product> = products
            .into_iter()
            .filter(|p| self.min_price.map_or(true, |min| p.price >= min))
            .filter(|p| self.max_price.map_or(true, |max| p.price <= max))
            .filter(|p| match self.rating {
                Some(min) => p.rating.is_some_and(|r| r.rate.round() >= f64::from(min)),
                None => true,
            })
            .collect();

        match self.sort {
            Some(SortOrder::PriceAsc) => products.sort_by(|a, b| a.price.cmp(&b.price)),
            Some(SortOrder::PriceDesc) => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Some(SortOrder::Rating) => products.sort_by(|a, b| rate_of(b).total_cmp(&rate_of(a))),
            Some(SortOrder::Newest) => products.reverse(),
            None => {}
        }
        products
    }
}

fn rate_of(product: &Product) -> f64 {
    product.rating.map_or(0.0, |r| r.rate)
}

#[derive(Debug, Clone)]
struct CachedResponse {
    fetched_at: Instant,
    body: String,
}

/// HTTP client for the catalog API
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    ttl: Duration,
    cache: Arc<RwLock<HashMap<String, CachedResponse>>>,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(config.catalog_url(), config.app().catalog_ttl)
    }

    pub fn with_base_url(base_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| CatalogError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let key = url.to_string();

        let cached = self.cache.read().await.get(&key).cloned();
        if let Some(entry) = cached {
            if entry.fetched_at.elapsed() < self.ttl {
                tracing::debug!("Catalog cache hit: {}", key);
                return Ok(serde_json::from_str(&entry.body)?);
            }
        }

        tracing::debug!("Fetching {}", key);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let value = serde_json::from_str(&body)?;

        self.cache.write().await.insert(
            key,
            CachedResponse {
                fetched_at: Instant::now(),
                body,
            },
        );
        Ok(value)
    }

    async fn fetch_list(&self, url: Result<Url, CatalogError>, what: &str) -> Vec<Product> {
        let result = match url {
            Ok(url) => self.fetch::<Vec<Product>>(url).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!("Error fetching {}: {}", what, e);
            Vec::new()
        })
    }

    /// Listing, narrowed to `query.category` if set, then filtered locally
    pub async fn products(&self, query: &ProductQuery) -> Vec<Product> {
        let url = match &query.category {
            Some(category) => self.url(&["products", "category", category.as_str()]),
            None => self.url(&["products"]),
        };
        let products = self.fetch_list(url, "products").await;
        query.apply(products)
    }

    pub async fn featured_products(&self) -> Vec<Product> {
        let url = self.url(&["products"]).map(|mut url| {
            url.query_pairs_mut()
                .append_pair("limit", &FEATURED_LIMIT.to_string());
            url
        });
        self.fetch_list(url, "featured products").await
    }

    pub async fn category_products(&self, category: &str) -> Vec<Product> {
        self.fetch_list(self.url(&["products", "category", category]), "category products")
            .await
    }

    /// Up to four products from `category`, excluding `exclude_id`
    pub async fn related_products(&self, category: &str, exclude_id: u64) -> Vec<Product> {
        self.category_products(category)
            .await
            .into_iter()
            .filter(|p| p.id != exclude_id)
            .take(RELATED_LIMIT)
            .collect()
    }

    pub async fn product(&self, id: u64) -> Option<Product> {
        let id_segment = id.to_string();
        let url = match self.url(&["products", id_segment.as_str()]) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Error fetching product {}: {}", id, e);
                return None;
            }
        };
        match self.fetch::<Product>(url).await {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!("Error fetching product {}: {}", id, e);
                None
            }
        }
    }

    /// Drop every cached response
    pub async fn invalidate(&self) {
        self.cache.write().await.clear();
    }
}

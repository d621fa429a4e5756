//! Catalog client against a wiremock product API

use std::time::Duration;

use luxemarket::client::catalog::{CatalogClient, ProductQuery, SortOrder};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing() -> serde_json::Value {
    json!([
        { "id": 1, "title": "Backpack", "price": 109.95, "description": "", "category": "men's clothing",
          "image": "https://img.example/1.jpg", "rating": { "rate": 3.9, "count": 120 } },
        { "id": 2, "title": "Slim T-Shirt", "price": 22.3, "description": "", "category": "men's clothing",
          "image": "https://img.example/2.jpg", "rating": { "rate": 4.1, "count": 259 } },
        { "id": 5, "title": "Dragon Bracelet", "price": 695, "description": "", "category": "jewelery",
          "image": "https://img.example/5.jpg", "rating": { "rate": 4.6, "count": 400 } }
    ])
}

fn client(server: &MockServer) -> CatalogClient {
    CatalogClient::with_base_url(server.uri(), Duration::from_secs(60))
}

#[tokio::test]
async fn test_listing_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = client(&server);
    let first = catalog.products(&ProductQuery::default()).await;
    let second = catalog.products(&ProductQuery::default().sort(SortOrder::PriceDesc)).await;

    assert_eq!(first.len(), 3);
    assert_eq!(second.iter().map(|p| p.id).collect::<Vec<_>>(), vec![5, 1, 2]);
}

#[tokio::test]
async fn test_invalidate_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .expect(2)
        .mount(&server)
        .await;

    let catalog = client(&server);
    catalog.products(&ProductQuery::default()).await;
    catalog.invalidate().await;
    catalog.products(&ProductQuery::default()).await;
}

#[tokio::test]
async fn test_featured_requests_four() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("limit", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).featured_products().await.len(), 3);
}

#[tokio::test]
async fn test_related_excludes_current_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/category/men's%20clothing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .mount(&server)
        .await;

    let related = client(&server).related_products("men's clothing", 2).await;
    assert_eq!(related.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 5]);
}

#[tokio::test]
async fn test_failures_degrade_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/99"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let catalog = client(&server);
    assert!(catalog.products(&ProductQuery::default()).await.is_empty());
    assert!(catalog.product(99).await.is_none());
}

#[tokio::test]
async fn test_single_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()[2].clone()))
        .mount(&server)
        .await;

    let product = client(&server).product(5).await.unwrap();
    assert_eq!(product.title, "Dragon Bracelet");
    assert_eq!(product.price, rust_decimal::Decimal::from(695));
}

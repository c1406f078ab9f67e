//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small paginated storefront and run
//! the full crawl cycle end-to-end against a SQLite store.

use storefront_harvest::config::{
    Config, ImageConfig, OutputConfig, RenderConfig, SiteConfig, UserAgentConfig,
};
use storefront_harvest::crawler::crawl;
use storefront_harvest::output::{export_by_category, CsvExporter};
use storefront_harvest::storage::{ListingStore, SqliteStorage};
use storefront_harvest::HarvestError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock storefront
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            listings_path: "/products".to_string(),
            max_pages: None,
        },
        render: RenderConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
            images_dir: "./test_images".to_string(),
            csv_path: None,
        },
        images: ImageConfig::default(),
    }
}

fn card(id: i64, name: &str, price: &str, categories: &[&str]) -> String {
    let spans: String = categories
        .iter()
        .map(|c| format!("<span>{}</span>", c))
        .collect();
    format!(
        r#"<div class="product-card">
            <a class="card-header" href="/products/{id}"><h4 class="title">{name}</h4></a>
            <p class="category">{spans}</p>
            <img class="image" srcset="/assets/{id}-small.jpg 200w, /assets/{id}-large.jpg 800w">
            <div class="price-wrapper">{price}</div>
        </div>"#
    )
}

fn page(cards: &[String], last: bool) -> String {
    let next = if last { "next disabled" } else { "next" };
    format!(
        r#"<html><body><main>{}</main>
        <ul class="pagination"><li class="prev"><a>Prev</a></li><li class="{}"><a>Next</a></li></ul>
        </body></html>"#,
        cards.join("\n"),
        next
    )
}

async fn mount_page(server: &MockServer, number: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("page", number.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_storefront(server: &MockServer, first_price: &str) {
    mount_page(
        server,
        1,
        page(
            &[
                card(1, "Catan", first_price, &["Strategy", "Family"]),
                card(2, "Dixit", "29,90 €", &["Party"]),
            ],
            false,
        ),
    )
    .await;
    mount_page(
        server,
        2,
        page(&[card(3, "Azul", "34,50 €", &["Family"])], false),
    )
    .await;
    mount_page(
        server,
        3,
        page(&[card(4, "Carcassonne", "25,00 €", &["Strategy"])], true),
    )
    .await;
}

#[tokio::test]
async fn test_full_crawl_three_pages() {
    let mock_server = MockServer::start().await;
    mount_storefront(&mock_server, "39,99 €").await;

    let config = create_test_config(&mock_server.uri(), ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let report = crawl(&config, &mut store).await.unwrap();

    assert_eq!(report.pages_visited, vec![1, 2, 3]);
    assert_eq!(report.listings_found, 4);
    assert_eq!(report.inserted, 4);
    assert_eq!(report.updated, 0);
    assert_eq!(store.count_listings().unwrap(), 4);

    let catan = store.find_by_external_id(1).unwrap().unwrap().listing;
    assert_eq!(catan.name, "Catan");
    assert_eq!(catan.price, 39.99);
    assert_eq!(catan.url, format!("{}/products/1", mock_server.uri()));
    assert_eq!(
        catan.image_url,
        Some(format!("{}/assets/1-large.jpg", mock_server.uri()))
    );
    assert_eq!(catan.categories, vec!["Strategy", "Family"]);
}

#[tokio::test]
async fn test_recrawl_updates_existing_listings() {
    let mock_server = MockServer::start().await;
    mount_storefront(&mock_server, "39,99 €").await;

    let config = create_test_config(&mock_server.uri(), ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();
    crawl(&config, &mut store).await.unwrap();

    // Same catalog, new price for the first listing
    mock_server.reset().await;
    mount_storefront(&mock_server, "35,00 €").await;

    let report = crawl(&config, &mut store).await.unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, 4);
    assert_eq!(store.count_listings().unwrap(), 4);

    let catan = store.find_by_external_id(1).unwrap().unwrap().listing;
    assert_eq!(catan.price, 35.0);
}

#[tokio::test]
async fn test_failed_page_aborts_crawl() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        1,
        page(&[card(1, "Catan", "39,99 €", &["Strategy"])], false),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let result = crawl(&config, &mut store).await;

    assert!(matches!(
        result,
        Err(HarvestError::Status { status: 500, .. })
    ));
    // Page 1 was reconciled before the failure
    assert_eq!(store.count_listings().unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_listings_are_skipped() {
    let mock_server = MockServer::start().await;
    let unpriced = r#"<div class="product-card">
        <a class="card-header" href="/products/8"><h4 class="title">Free Sample</h4></a>
        <div class="price-wrapper">Ask us</div>
    </div>"#
        .to_string();
    mount_page(
        &mock_server,
        1,
        page(&[unpriced, card(9, "Hive", "24,00 €", &["Abstract"])], true),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), ":memory:");
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let report = crawl(&config, &mut store).await.unwrap();

    assert_eq!(report.rejected, 1);
    assert_eq!(report.inserted, 1);
    assert!(store.find_by_external_id(8).unwrap().is_none());
    assert!(store.find_by_external_id(9).unwrap().is_some());
}

#[tokio::test]
async fn test_crawl_into_file_store_then_export() {
    let mock_server = MockServer::start().await;
    mount_storefront(&mock_server, "39,99 €").await;

    let dir = tempfile::TempDir::new().unwrap();
    let db_path = dir.path().join("data").join("catalog.db");
    let config = create_test_config(&mock_server.uri(), &db_path.to_string_lossy());

    {
        let mut store = SqliteStorage::new(&db_path).unwrap();
        crawl(&config, &mut store).await.unwrap();
    }

    // Reopen to read what was persisted
    let store = SqliteStorage::new(&db_path).unwrap();
    let mut exporter = CsvExporter::new(Vec::new());
    let rows = export_by_category(&store, &mut exporter).unwrap();
    let csv = String::from_utf8(exporter.into_inner().unwrap()).unwrap();

    // Catan and Azul in Family, Dixit in Party, Catan and Carcassonne in Strategy
    assert_eq!(rows, 5);
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("category,external_id,name"));
    assert!(lines[1].starts_with("Family,1,Catan,"));
    assert!(lines[2].starts_with("Family,3,Azul,"));
    assert!(lines[3].starts_with("Party,2,Dixit,"));
    assert!(lines[5].starts_with("Strategy,4,Carcassonne,"));
}

//! Integration tests for the image pipeline
//!
//! A wiremock server serves a generated PNG; the pipeline writes into a
//! temporary directory tree.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use storefront_harvest::config::ImageConfig;
use storefront_harvest::images::ImagePipeline;
use storefront_harvest::storage::ImageSource;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

async fn serve_image(server: &MockServer, image_path: &str, expected_downloads: u64) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(320, 240)),
        )
        .expect(expected_downloads)
        .mount(server)
        .await;
}

fn small_sizes() -> ImageConfig {
    ImageConfig {
        sizes: vec![16, 48, 96],
        ..ImageConfig::default()
    }
}

fn source(server: &MockServer, image_path: &str, external_id: i64) -> ImageSource {
    ImageSource {
        image_url: format!("{}{}", server.uri(), image_path),
        external_id,
    }
}

fn dimensions(path: &Path) -> (u32, u32) {
    let img = image::open(path).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn test_writes_every_size() {
    let mock_server = MockServer::start().await;
    serve_image(&mock_server, "/assets/action.png", 1).await;
    let root = TempDir::new().unwrap();

    let pipeline = ImagePipeline::new(reqwest::Client::new(), root.path(), &small_sizes());
    let report = pipeline
        .run(&[source(&mock_server, "/assets/action.png", 42)])
        .await;

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 0);

    let dir = root.path().join("game_42");
    assert_eq!(dimensions(&dir.join("action_42_16x16.jpg")), (16, 16));
    assert_eq!(dimensions(&dir.join("action_42_48x48.jpg")), (48, 48));
    assert_eq!(dimensions(&dir.join("action_42_96x96.jpg")), (96, 96));
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 3);
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let mock_server = MockServer::start().await;
    // Exactly one download across both runs
    serve_image(&mock_server, "/assets/action.png", 1).await;
    let root = TempDir::new().unwrap();

    let pipeline = ImagePipeline::new(reqwest::Client::new(), root.path(), &small_sizes());
    let sources = [source(&mock_server, "/assets/action.png", 42)];

    let first = pipeline.run(&sources).await;
    let second = pipeline.run(&sources).await;

    assert_eq!(first.processed, 1);
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped_existing, 1);
}

#[tokio::test]
async fn test_missing_smallest_size_triggers_redownload() {
    let mock_server = MockServer::start().await;
    serve_image(&mock_server, "/assets/action.png", 2).await;
    let root = TempDir::new().unwrap();

    let pipeline = ImagePipeline::new(reqwest::Client::new(), root.path(), &small_sizes());
    let sources = [source(&mock_server, "/assets/action.png", 42)];
    pipeline.run(&sources).await;

    let dir = root.path().join("game_42");
    std::fs::remove_file(dir.join("action_42_16x16.jpg")).unwrap();
    std::fs::write(dir.join("leftover.tmp"), b"partial").unwrap();

    let report = pipeline.run(&sources).await;

    assert_eq!(report.processed, 1);
    assert!(dir.join("action_42_16x16.jpg").is_file());
    // The stale directory was replaced as a whole
    assert!(!dir.join("leftover.tmp").exists());
}

#[tokio::test]
async fn test_item_failures_do_not_stop_the_run() {
    let mock_server = MockServer::start().await;
    serve_image(&mock_server, "/assets/party.png", 1).await;
    Mock::given(method("GET"))
        .and(path("/assets/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets/broken.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not an image"))
        .mount(&mock_server)
        .await;
    let root = TempDir::new().unwrap();

    let pipeline = ImagePipeline::new(reqwest::Client::new(), root.path(), &small_sizes());
    let report = pipeline
        .run(&[
            source(&mock_server, "/assets/missing.jpg", 1),
            source(&mock_server, "/assets/card.gif", 2),
            source(&mock_server, "/assets/broken.jpg", 3),
            source(&mock_server, "/assets/party.png", 4),
        ])
        .await;

    assert_eq!(report.failed, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.processed, 1);
    assert!(root.path().join("game_4/party_4_96x96.jpg").is_file());
    assert!(!root.path().join("game_2").exists());
    // Failed listings leave nothing behind that a later run could mistake for done
    assert!(!root.path().join("game_1").exists());
    assert!(!root.path().join("game_3").exists());
}

#[tokio::test]
async fn test_undecodable_image_is_retried_on_next_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/action.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("truncated"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    serve_image(&mock_server, "/assets/action.jpg", 1).await;
    let root = TempDir::new().unwrap();

    let pipeline = ImagePipeline::new(reqwest::Client::new(), root.path(), &small_sizes());
    let sources = [source(&mock_server, "/assets/action.jpg", 7)];

    let first = pipeline.run(&sources).await;
    assert_eq!(first.failed, 1);
    assert!(!root.path().join("game_7").exists());

    let second = pipeline.run(&sources).await;
    assert_eq!(second.processed, 1);
    assert_eq!(std::fs::read_dir(root.path().join("game_7")).unwrap().count(), 3);
}

#[tokio::test]
async fn test_default_sizes_layout() {
    let mock_server = MockServer::start().await;
    serve_image(&mock_server, "/assets/action.jpg", 1).await;
    let root = TempDir::new().unwrap();

    let pipeline = ImagePipeline::new(reqwest::Client::new(), root.path(), &ImageConfig::default());
    let report = pipeline
        .run(&[source(&mock_server, "/assets/action.jpg", 42)])
        .await;

    assert_eq!(report.processed, 1);

    let dir = root.path().join("game_42");
    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "action_42_100x100.jpg",
            "action_42_2000x2000.jpg",
            "action_42_500x500.jpg",
        ]
    );
    assert_eq!(dimensions(&dir.join("action_42_100x100.jpg")), (100, 100));
    assert_eq!(dimensions(&dir.join("action_42_500x500.jpg")), (500, 500));
    assert_eq!(dimensions(&dir.join("action_42_2000x2000.jpg")), (2000, 2000));
}

#[tokio::test]
async fn test_concurrent_run_with_duplicate_ids() {
    let mock_server = MockServer::start().await;
    serve_image(&mock_server, "/assets/family.png", 3).await;
    let root = TempDir::new().unwrap();

    let config = ImageConfig {
        concurrency: 4,
        ..small_sizes()
    };
    let pipeline = ImagePipeline::new(reqwest::Client::new(), root.path(), &config);
    let report = pipeline
        .run(&[
            source(&mock_server, "/assets/family.png", 1),
            source(&mock_server, "/assets/family.png", 2),
            source(&mock_server, "/assets/family.png", 1),
            source(&mock_server, "/assets/family.png", 3),
        ])
        .await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.processed, 3);
    for id in 1..=3 {
        let file = format!("game_{id}/family_{id}_48x48.jpg");
        assert!(root.path().join(file).is_file());
    }
}

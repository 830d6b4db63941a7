//! End-to-end tests driving the axum router in-process.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{Rgb, RgbImage};
use tower::ServiceExt;

use dzi_server::config::{ColorMode, DeepZoomOptions};
use dzi_server::server::{create_router, AppState, RouterConfig};
use dzi_server::slide::SlideCache;
use dzi_server::source::ImageFileOpener;
use dzi_server::tile::TileService;

// =============================================================================
// Test Utilities
// =============================================================================

/// Create a unique, empty slide directory for one test.
fn temp_slide_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dzi-server-it-{tag}-{}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 64]))
}

fn test_router(slide_root: &Path) -> Router {
    let cache = SlideCache::new(
        Arc::new(ImageFileOpener::new()),
        NonZeroUsize::new(8).unwrap(),
        DeepZoomOptions::default(),
        ColorMode::Default,
    );
    let service = TileService::new(cache, slide_root.to_path_buf(), 75);
    create_router(
        AppState::new(service),
        RouterConfig::default().with_tracing(false),
    )
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status, body.to_vec(), content_type)
}

// =============================================================================
// Descriptor
// =============================================================================

#[tokio::test]
async fn descriptor_reports_slide_dimensions() {
    let root = temp_slide_dir("descriptor");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    let (status, body, content_type) = get(&router, "/slide.png.dzi").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));

    let xml = String::from_utf8(body).unwrap();
    assert!(xml.contains("TileSize=\"254\""));
    assert!(xml.contains("Overlap=\"1\""));
    assert!(xml.contains("Format=\"jpeg\""));
    assert!(xml.contains("xmlns=\"http://schemas.microsoft.com/deepzoom/2008\""));
    assert!(xml.contains("<Size Width=\"300\" Height=\"200\"/>"));
}

#[tokio::test]
async fn descriptor_for_missing_slide_is_404() {
    let root = temp_slide_dir("descriptor-missing");
    let router = test_router(&root);

    let (status, _, _) = get(&router, "/missing.png.dzi").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Tiles
// =============================================================================

#[tokio::test]
async fn corner_tile_has_clipped_dimensions() {
    let root = temp_slide_dir("tile-corner");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    // max level = ceil(log2(300)) = 9; the (0,0) tile loses the overlap
    // at the origin and the slide ends inside the tile.
    let (status, body, content_type) = get(&router, "/slide.png_files/9/0_0.jpeg").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));

    let tile = image::load_from_memory(&body).unwrap();
    assert_eq!((tile.width(), tile.height()), (255, 200));
}

#[tokio::test]
async fn edge_tile_is_strictly_smaller() {
    let root = temp_slide_dir("tile-edge");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    let (status, body, _) = get(&router, "/slide.png_files/9/1_0.jpeg").await;

    assert_eq!(status, StatusCode::OK);
    let tile = image::load_from_memory(&body).unwrap();
    assert_eq!((tile.width(), tile.height()), (47, 200));
}

#[tokio::test]
async fn downsampled_level_tile_is_resized() {
    let root = temp_slide_dir("tile-downsampled");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    let (status, body, _) = get(&router, "/slide.png_files/8/0_0.jpeg").await;

    assert_eq!(status, StatusCode::OK);
    let tile = image::load_from_memory(&body).unwrap();
    assert_eq!((tile.width(), tile.height()), (150, 100));
}

#[tokio::test]
async fn out_of_range_levels_are_404() {
    let root = temp_slide_dir("tile-levels");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    for uri in ["/slide.png_files/0/0_0.jpeg", "/slide.png_files/10/0_0.jpeg"] {
        let (status, _, _) = get(&router, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn out_of_range_addresses_are_404() {
    let root = temp_slide_dir("tile-address");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    let (status, _, _) = get(&router, "/slide.png_files/9/7_0.jpeg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&router, "/slide.png_files/9/0_7.jpeg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_jpeg_tile_format_is_404() {
    let root = temp_slide_dir("tile-format");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    let (status, _, _) = get(&router, "/slide.png_files/9/0_0.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Viewer Pages
// =============================================================================

#[tokio::test]
async fn index_lists_readable_slides() {
    let root = temp_slide_dir("index");
    gradient(64, 64).save(root.join("a.png")).unwrap();
    std::fs::create_dir_all(root.join("cases")).unwrap();
    gradient(64, 64).save(root.join("cases/b.png")).unwrap();
    std::fs::write(root.join("notes.txt"), "ignored").unwrap();

    let router = test_router(&root);
    let (status, body, _) = get(&router, "/").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("a.png"));
    assert!(html.contains("cases/b.png"));
    assert!(!html.contains("notes.txt"));
}

#[tokio::test]
async fn viewer_page_embeds_descriptor_url() {
    let root = temp_slide_dir("viewer");
    gradient(300, 200).save(root.join("slide.png")).unwrap();
    let router = test_router(&root);

    let (status, body, _) = get(&router, "/slide.png").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/slide.png.dzi"));
    assert!(html.contains("OpenSeadragon"));
}

#[tokio::test]
async fn nested_slide_paths_work_end_to_end() {
    let root = temp_slide_dir("nested");
    std::fs::create_dir_all(root.join("case-1/scans")).unwrap();
    gradient(300, 200)
        .save(root.join("case-1/scans/slide.png"))
        .unwrap();
    let router = test_router(&root);

    let (status, _, _) = get(&router, "/case-1/scans/slide.png.dzi").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = get(&router, "/case-1/scans/slide.png_files/9/0_0.jpeg").await;
    assert_eq!(status, StatusCode::OK);
    let tile = image::load_from_memory(&body).unwrap();
    assert_eq!((tile.width(), tile.height()), (255, 200));
}

// =============================================================================
// Path Containment
// =============================================================================

#[tokio::test]
async fn traversal_outside_slide_root_is_404() {
    let parent = temp_slide_dir("containment");
    let root = parent.join("slides");
    std::fs::create_dir_all(&root).unwrap();
    gradient(64, 64).save(parent.join("outside.png")).unwrap();

    let router = test_router(&root);

    // The file exists on disk, but only paths under the slide root are
    // served.
    let (status, _, _) = get(&router, "/../outside.png.dzi").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(&router, "/sub/../../outside.png.dzi").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

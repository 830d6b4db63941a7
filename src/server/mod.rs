//! HTTP layer.
//!
//! A thin axum surface over the tile service:
//!
//! ```text
//! GET /                                        - directory index
//! GET /{path}.dzi                              - DZI descriptor
//! GET /{path}_files/{level}/{col}_{row}.{fmt}  - tile
//! GET /{path}                                  - slide viewer page
//! ```
//!
//! The three slide routes share one wildcard and are told apart by
//! [`routes::parse_slide_request`]; every per-request failure maps to 404.

pub mod handlers;
pub mod routes;
pub mod viewer;

pub use handlers::{AppState, ErrorResponse};
pub use routes::{create_router, parse_slide_request, RouterConfig, SlideRequest};

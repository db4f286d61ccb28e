//! # tod-server
//!
//! HTTP front end for the card pipeline.
//!
//! One endpoint (`POST /api/questions` by default) takes a content type, a
//! difficulty level and a category and always answers with a card: a
//! generated one when the provider cooperates, otherwise one from the
//! fallback catalog. `GET /healthz` reports liveness.
//!
//! ```bash
//! curl -X POST localhost:3000/api/questions \
//!     -H 'content-type: application/json' \
//!     -d '{"contentType":"question","difficultyLevel":"spicy","category":"travel"}'
//! ```

pub mod config;
pub mod routes;
pub mod server;

pub use config::{ConfigError, ServerConfig, CONFIG_FILE_DEFAULT};
pub use server::{build_state, router, run, AppState};

//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour monter les routes HTTP de
//! PMOCheck sur un serveur Axum.
//!
//! ## Fonctionnalités
//!
//! - **Composition de routers** : chaque crate fournit son `Router`, le serveur les assemble
//! - **Documentation OpenAPI** : Swagger UI généré à partir de `utoipa`
//! - **Logs en mémoire** : buffer circulaire des derniers événements `tracing`, exposé sur `/log-dump`
//! - **Arrêt gracieux** : arrêt propre sur Ctrl+C
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use pmoserver::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", 3000).build();
//!
//!     server.add_router("/", Router::new().route("/status", get(|| async { "ok" })));
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogEntry, LogState, LoggingOptions, log_dump};
pub use server::{Server, ServerBuilder, ServerInfo};

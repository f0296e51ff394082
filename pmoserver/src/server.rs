//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module cache la configuration d'Axum derrière un petit objet `Server` :
//! on y ajoute des routers, une documentation OpenAPI, le système de logs, puis
//! on démarre l'écoute HTTP.
//!
//! - **Routers** : `add_router()` monte un `Router` à la racine ou sous un préfixe
//! - **Documentation API** : OpenAPI/Swagger avec `add_openapi()`
//! - **Logs** : `init_logging()` installe `tracing` et la route `/log-dump`
//! - **Gestion gracieuse** : arrêt propre sur Ctrl+C

use crate::logs::{LoggingOptions, init_logging, log_dump};
use anyhow::Result;
use axum::Router;
use axum::routing::get;
use pmoconfig::Config;
use serde::Serialize;
use std::net::SocketAddr;
use tokio::{signal, task::JoinHandle};
use tracing::{error, info, warn};
use utoipa_swagger_ui::SwaggerUi;

/// Info serveur sérialisable
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ServerInfo {
    pub name: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    http_port: u16,
    router: Router,
    join_handle: Option<JoinHandle<()>>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            http_port,
            router: Router::new(),
            join_handle: None,
        }
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub fn add_router(&mut self, path: &str, sub_router: Router) {
        let current = std::mem::take(&mut self.router);
        self.router = if path == "/" {
            current.merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            current.nest(&normalized, sub_router)
        };
    }

    /// Ajoute la documentation OpenAPI et Swagger UI
    ///
    /// - `/swagger-ui/{name}` affiche la documentation
    /// - `/api-docs/{name}.json` fournit la spécification OpenAPI
    pub fn add_openapi(&mut self, openapi: utoipa::openapi::OpenApi, name: &str) {
        let swagger = SwaggerUi::new(format!("/swagger-ui/{}", name))
            .url(format!("/api-docs/{}.json", name), openapi);

        let current = std::mem::take(&mut self.router);
        self.router = current.merge(swagger);
    }

    /// Initialise le système de logging et enregistre la route `/log-dump`
    pub fn init_logging(&mut self, options: LoggingOptions) {
        let log_state = init_logging(options);
        let route = Router::new()
            .route("/log-dump", get(log_dump))
            .with_state(log_state);
        self.add_router("/", route);
    }

    /// Retourne une copie du router courant
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Démarre le serveur HTTP
    ///
    /// Le port est lié immédiatement : une erreur de bind est retournée à
    /// l'appelant au lieu de faire paniquer la tâche du serveur.
    pub async fn start(&mut self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(name = %self.name, %addr, "Server running");

        let router = self.router.clone();
        self.join_handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                error!("HTTP server stopped with error: {}", e);
            }
        }));

        Ok(())
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            http_port: self.http_port,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C reçu, arrêt gracieux");
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    http_port: u16,
}

impl ServerBuilder {
    /// Crée un nouveau builder
    pub fn new(name: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            http_port,
        }
    }

    /// Builder à partir de la configuration (`host.http_port`)
    pub fn new_configured(config: &Config) -> Self {
        Self {
            name: "PMOCheck".to_string(),
            http_port: config.get_http_port(),
        }
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.http_port)
    }
}

//! Logs en mémoire
//!
//! Les événements `tracing` sont conservés dans un buffer circulaire de taille
//! fixe ; la route `/log-dump` en renvoie le contenu au format JSON.

mod bufferlayer;

pub use bufferlayer::BufferLayer;

use std::{
    collections::VecDeque,
    sync::{Arc, RwLock},
    time::SystemTime,
};

use axum::{Json, extract::State, response::IntoResponse};
use pmoconfig::Config;
use serde::Serialize;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Représente une entrée de log
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Buffer circulaire partagé
#[derive(Clone)]
pub struct LogState {
    buffer: Arc<RwLock<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogState {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, entry: LogEntry) {
        // Un verrou empoisonné ne doit pas faire paniquer le logging
        if let Ok(mut buf) = self.buffer.write() {
            if buf.len() == self.capacity {
                buf.pop_front();
            }
            buf.push_back(entry);
        }
    }

    /// Copie des entrées, de la plus ancienne à la plus récente
    pub fn dump(&self) -> Vec<LogEntry> {
        self.buffer
            .read()
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Handler REST (dump JSON du buffer)
pub async fn log_dump(State(state): State<LogState>) -> impl IntoResponse {
    Json(state.dump())
}

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Niveau minimum des événements retenus
    pub min_level: LevelFilter,
    /// Capacité du buffer circulaire (nombre d'entrées conservées)
    pub buffer_capacity: usize,
    /// Activer la sortie vers stderr/stdout
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::INFO,
            buffer_capacity: 1000,
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Lit les options depuis `host.logger.*`
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_level: string_to_levelfilter(&config.get_log_min_level())
                .unwrap_or(LevelFilter::INFO),
            buffer_capacity: config.get_log_cache_size(),
            enable_console: config.get_log_enable_console(),
        }
    }
}

/// Initialise le système de logging avec le buffer et optionnellement la console
///
/// Si un subscriber global est déjà installé (tests, double initialisation),
/// le buffer est retourné quand même mais ne recevra pas d'événements.
///
/// # Exemple
/// ```rust,no_run
/// use pmoserver::logs::{init_logging, LoggingOptions};
///
/// let log_state = init_logging(LoggingOptions::default());
/// ```
pub fn init_logging(options: LoggingOptions) -> LogState {
    let log_state = LogState::new(options.buffer_capacity);

    // Le filtre doit être appliqué avant le buffer
    let subscriber = Registry::default()
        .with(options.min_level)
        .with(BufferLayer::new(log_state.clone()));

    let result = if options.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }

    log_state
}

fn string_to_levelfilter(s: &str) -> Option<LevelFilter> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(LevelFilter::ERROR),
        "WARN" | "WARNING" => Some(LevelFilter::WARN),
        "INFO" => Some(LevelFilter::INFO),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "TRACE" => Some(LevelFilter::TRACE),
        "OFF" => Some(LevelFilter::OFF),
        _ => None,
    }
}

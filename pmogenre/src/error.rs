//! Erreurs de chargement de la taxonomie

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenreError>;

#[derive(Error, Debug)]
pub enum GenreError {
    /// Fichier de taxonomie illisible
    #[error("Cannot read taxonomy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML taxonomy: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON taxonomy: {0}")]
    Json(#[from] serde_json::Error),

    /// Politique de classification inconnue dans la configuration
    #[error("Unknown match policy '{0}' (expected first_match or all_matches)")]
    InvalidPolicy(String),
}

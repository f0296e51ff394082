//! Extension pour intégrer la configuration Spotify dans pmoconfig
//!
//! ```yaml
//! accounts:
//!   spotify:
//!     client_id: ...
//!     client_secret: ...
//! spotify:
//!   cache:
//!     ttl_secs: 3600
//!     stale_policy: serve_stale
//!   fetch:
//!     batch_size: 100
//!     max_concurrent_pages: 4
//!     request_timeout_secs: 10
//! ```
//!
//! Les variables `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` et `CACHETIMEOUT`
//! alimentent les mêmes clés.

use crate::api::API_BASE_URL;
use crate::api::auth::TOKEN_URL;
use crate::batch::{DEFAULT_BATCH_SIZE, DEFAULT_REQUEST_TIMEOUT, FetchSettings};
use crate::cache::StalePolicy;
use anyhow::{Result, anyhow};
use pmoconfig::Config;
use std::time::Duration;

/// Trait d'extension pour la configuration Spotify
pub trait SpotifyConfigExt {
    /// Récupère les credentials de l'application (client id, client secret)
    ///
    /// # Errors
    ///
    /// Retourne une erreur si l'un des deux n'est pas configuré
    fn get_spotify_credentials(&self) -> Result<(String, String)>;

    fn get_spotify_token_url(&self) -> String;

    fn get_spotify_api_url(&self) -> String;

    /// Durée de validité d'une playlist en cache (`spotify.cache.ttl_secs`)
    ///
    /// # Errors
    ///
    /// Cette valeur n'a pas de défaut : son absence est une erreur de démarrage
    fn get_cache_ttl(&self) -> Result<Duration>;

    fn get_stale_policy(&self) -> Result<StalePolicy>;

    /// Paramètres de pagination (`spotify.fetch.*`)
    fn get_fetch_settings(&self) -> Result<FetchSettings>;
}

impl SpotifyConfigExt for Config {
    fn get_spotify_credentials(&self) -> Result<(String, String)> {
        let client_id = self.require_string(&["accounts", "spotify", "client_id"])?;
        let client_secret = self.require_string(&["accounts", "spotify", "client_secret"])?;
        Ok((client_id, client_secret))
    }

    fn get_spotify_token_url(&self) -> String {
        self.get_string(&["accounts", "spotify", "token_url"])
            .unwrap_or_else(|| TOKEN_URL.to_string())
    }

    fn get_spotify_api_url(&self) -> String {
        self.get_string(&["accounts", "spotify", "api_url"])
            .unwrap_or_else(|| API_BASE_URL.to_string())
    }

    fn get_cache_ttl(&self) -> Result<Duration> {
        let secs = self.require_u64(&["spotify", "cache", "ttl_secs"])?;
        Ok(Duration::from_secs(secs))
    }

    fn get_stale_policy(&self) -> Result<StalePolicy> {
        match self.get_string(&["spotify", "cache", "stale_policy"]) {
            Some(policy) => Ok(policy.parse()?),
            None => Ok(StalePolicy::default()),
        }
    }

    fn get_fetch_settings(&self) -> Result<FetchSettings> {
        let batch_size = self
            .get_u64(&["spotify", "fetch", "batch_size"])?
            .unwrap_or(DEFAULT_BATCH_SIZE as u64);
        if batch_size == 0 {
            return Err(anyhow!("spotify.fetch.batch_size must be greater than 0"));
        }

        let max_concurrent_pages = match self.get_u64(&["spotify", "fetch", "max_concurrent_pages"])? {
            Some(0) => return Err(anyhow!("spotify.fetch.max_concurrent_pages must be greater than 0")),
            other => other.map(|n| n as usize),
        };

        let request_timeout = match self.get_u64(&["spotify", "fetch", "request_timeout_secs"])? {
            Some(0) => return Err(anyhow!("spotify.fetch.request_timeout_secs must be greater than 0")),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(FetchSettings {
            batch_size: batch_size as usize,
            max_concurrent_pages,
            request_timeout,
        })
    }
}

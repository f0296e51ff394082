//! Couche d'accès à l'API Web Spotify
//!
//! Ce module fournit une interface bas-niveau pour communiquer avec l'API
//! Spotify : `SpotifyApi` implémente [`PagingClient`](crate::PagingClient)
//! (pistes d'une playlist) et [`MetadataSource`](crate::MetadataSource)
//! (genres d'une piste).

pub mod auth;
pub mod playlists;
pub mod tracks;

pub use auth::ClientCredentials;

use crate::config_ext::SpotifyConfigExt;
use crate::error::{Result, SpotifyError};
use pmoconfig::Config;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// URL de base de l'API Spotify
pub const API_BASE_URL: &str = "https://api.spotify.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client API bas-niveau pour communiquer avec Spotify
pub struct SpotifyApi {
    /// Client HTTP
    client: Client,
    /// URL de base (surchargée dans les tests)
    api_url: Url,
    credentials: ClientCredentials,
}

impl SpotifyApi {
    /// Crée une nouvelle instance de l'API sur l'URL publique de Spotify
    pub fn new(credentials: ClientCredentials) -> Result<Self> {
        Self::with_settings(API_BASE_URL, credentials, DEFAULT_TIMEOUT)
    }

    /// Crée une instance avec une URL de base et un délai maximal par requête
    pub fn with_settings(
        api_url: impl Into<String>,
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let api_url: String = api_url.into();
        let api_url = Url::parse(api_url.trim_end_matches('/')).map_err(|e| {
            SpotifyError::Config(anyhow::anyhow!("Invalid API URL '{}': {}", api_url, e))
        })?;
        if api_url.cannot_be_a_base() {
            return Err(SpotifyError::Config(anyhow::anyhow!(
                "API URL '{}' cannot be a base",
                api_url
            )));
        }

        Ok(Self {
            client,
            api_url,
            credentials,
        })
    }

    /// Crée une instance à partir de `accounts.spotify.*` et `spotify.fetch.*`
    pub fn from_config(config: &Config) -> Result<Self> {
        let (client_id, client_secret) = config.get_spotify_credentials()?;
        let credentials =
            ClientCredentials::new(config.get_spotify_token_url(), client_id, client_secret);
        let settings = config.get_fetch_settings()?;
        Self::with_settings(
            config.get_spotify_api_url(),
            credentials,
            settings.request_timeout,
        )
    }

    /// Retourne l'URL de base
    pub fn api_url(&self) -> &str {
        self.api_url.as_str()
    }

    /// Construit l'URL d'un endpoint ; chaque segment est percent-encodé
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SpotifyError::Config(anyhow::anyhow!("API URL '{}' cannot be a base", self.api_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Effectue une requête GET authentifiée à l'API
    ///
    /// Un 401 invalide le jeton courant : la requête suivante en demandera un nouveau.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint_url(segments)?;
        let token = self.credentials.bearer_token(&self.client).await?;

        debug!("GET {} with {} params", url, params.len());

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.credentials.clear().await;
        }
        self.handle_response(response).await
    }

    /// Traite la réponse HTTP
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("API error ({}): {}", status.as_u16(), error_text);
            return Err(SpotifyError::from_status_code(status.as_u16(), error_text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SpotifyError::JsonParse(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_is_normalized() {
        let credentials = ClientCredentials::new("http://localhost/token", "id", "secret");
        let api =
            SpotifyApi::with_settings("http://localhost/v1/", credentials, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(api.api_url(), "http://localhost/v1");
    }

    #[test]
    fn test_ids_cannot_escape_their_path_segment() {
        let credentials = ClientCredentials::new("http://localhost/token", "id", "secret");
        let api =
            SpotifyApi::with_settings("http://localhost/v1", credentials, DEFAULT_TIMEOUT).unwrap();

        let url = api
            .endpoint_url(&["tracks", "x/../../playlists/y?market=FR"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost/v1/tracks/x%2F..%2F..%2Fplaylists%2Fy%3Fmarket=FR"
        );

        let url = api.endpoint_url(&["playlists", "p1", "tracks"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost/v1/playlists/p1/tracks");
    }

    #[test]
    fn test_invalid_api_url_is_a_config_error() {
        let credentials = ClientCredentials::new("http://localhost/token", "id", "secret");
        assert!(matches!(
            SpotifyApi::with_settings("not a url", credentials, DEFAULT_TIMEOUT),
            Err(SpotifyError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = Config::from_parts("/tmp/pmocheck", None, Vec::<(String, String)>::new()).unwrap();
        assert!(matches!(
            SpotifyApi::from_config(&config),
            Err(SpotifyError::Config(_))
        ));
    }
}

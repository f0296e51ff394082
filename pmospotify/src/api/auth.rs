//! Échange client-credentials
//!
//! Le jeton d'accès est obtenu par `POST <token_url>` avec
//! `grant_type=client_credentials` et une authentification Basic. Il est
//! réutilisé jusqu'à 60 secondes avant son expiration.

use crate::error::{Result, SpotifyError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// URL publique de l'échange de jetons
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Marge avant expiration en deçà de laquelle le jeton est renouvelé
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Réponse de l'endpoint de jetons
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_usable(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Identifiants d'application et jeton courant
pub struct ClientCredentials {
    token_url: String,
    client_id: String,
    client_secret: String,
    /// Le verrou sérialise les renouvellements concurrents
    token: Mutex<Option<AccessToken>>,
}

impl ClientCredentials {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        }
    }

    /// Retourne un jeton valide, en le renouvelant si nécessaire
    ///
    /// # Errors
    ///
    /// * `SpotifyError::AuthFailed` - l'échange a été refusé ou n'a pas abouti
    pub async fn bearer_token(&self, client: &Client) -> Result<String> {
        let mut current = self.token.lock().await;

        if let Some(token) = current.as_ref().filter(|t| t.is_usable()) {
            return Ok(token.value.clone());
        }

        let token = self.request_token(client).await?;
        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    /// Oublie le jeton courant
    pub async fn clear(&self) {
        debug!("Clearing access token");
        *self.token.lock().await = None;
    }

    async fn request_token(&self, client: &Client) -> Result<AccessToken> {
        debug!(client_id = %self.client_id, "Requesting access token");

        let response = client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SpotifyError::AuthFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Token exchange rejected ({}): {}", status.as_u16(), body);
            return Err(SpotifyError::AuthFailed(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::AuthFailed(format!("invalid token response: {}", e)))?;

        info!(expires_in = token.expires_in, "Spotify access token obtained");

        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_token_expiry_margin() {
        let token = AccessToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(120),
        };
        assert!(token.is_usable());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!token.is_usable());
    }
}

//! Gestion des erreurs pour le client Spotify

use thiserror::Error;

/// Type Result personnalisé pour pmospotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Erreurs possibles lors de l'utilisation du client Spotify
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// L'échange client-credentials a été refusé
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Échec d'un appel paginé (transport, timeout, statut non-2xx)
    #[error("Fetch of {collection_id} failed at offset {offset} (limit {limit}): {reason}")]
    FetchFailed {
        collection_id: String,
        offset: usize,
        limit: usize,
        reason: String,
    },

    /// Le catalogue ne connaît pas la piste
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Erreur de l'API Spotify
    #[error("Spotify API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Quota dépassé (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,
}

impl SpotifyError {
    /// Crée une erreur API depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::AuthFailed(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// Enveloppe une erreur quelconque dans un `FetchFailed` pour la fenêtre donnée
    pub fn fetch_failed(
        collection_id: &str,
        offset: usize,
        limit: usize,
        reason: impl ToString,
    ) -> Self {
        Self::FetchFailed {
            collection_id: collection_id.to_string(),
            offset,
            limit,
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SpotifyError::TrackNotFound(_) | SpotifyError::ApiError { code: 404, .. }
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, SpotifyError::AuthFailed(_))
    }

    /// Message destiné aux clients HTTP, sans le contenu des réponses de Spotify
    pub fn public_message(&self) -> String {
        match self {
            SpotifyError::AuthFailed(_) => "Authentication with Spotify failed".to_string(),
            SpotifyError::FetchFailed {
                collection_id,
                offset,
                limit,
                ..
            } => format!(
                "Fetch of {} failed at offset {} (limit {})",
                collection_id, offset, limit
            ),
            SpotifyError::TrackNotFound(id) => format!("Track not found: {}", id),
            SpotifyError::Http(_) => "Spotify request failed".to_string(),
            SpotifyError::JsonParse(_) => "Invalid response from Spotify".to_string(),
            SpotifyError::Config(_) => "Service misconfigured".to_string(),
            SpotifyError::ApiError { code, .. } => format!("Spotify API error (code {})", code),
            SpotifyError::RateLimitExceeded => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(SpotifyError::from_status_code(401, "expired").is_auth_error());
        assert!(matches!(
            SpotifyError::from_status_code(429, ""),
            SpotifyError::RateLimitExceeded
        ));
        assert!(SpotifyError::from_status_code(404, "missing").is_not_found());
        assert!(!SpotifyError::from_status_code(500, "boom").is_not_found());
    }

    #[test]
    fn test_fetch_failed_message() {
        let err = SpotifyError::fetch_failed("p1", 200, 50, "connection reset");
        assert_eq!(
            err.to_string(),
            "Fetch of p1 failed at offset 200 (limit 50): connection reset"
        );
    }

    #[test]
    fn test_public_message_hides_upstream_details() {
        let err = SpotifyError::fetch_failed("p1", 200, 50, "body: {\"secret\":1}");
        assert_eq!(err.public_message(), "Fetch of p1 failed at offset 200 (limit 50)");

        let err = SpotifyError::from_status_code(500, "stack trace from upstream");
        assert_eq!(err.public_message(), "Spotify API error (code 500)");

        let err = SpotifyError::from_status_code(401, "token tok-123 expired");
        assert!(!err.public_message().contains("tok-123"));
    }
}

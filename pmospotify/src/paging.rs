//! Source de données paginée

use crate::error::Result;
use crate::models::Page;
use async_trait::async_trait;

/// Accès à une collection paginée (les pistes d'une playlist)
///
/// `limit` est toujours strictement positif. Toute erreur de transport, tout
/// dépassement de délai et tout statut non-2xx doit être rendu sous la forme
/// d'un [`SpotifyError::FetchFailed`](crate::SpotifyError::FetchFailed).
#[async_trait]
pub trait PagingClient: Send + Sync {
    async fn fetch_page(&self, collection_id: &str, offset: usize, limit: usize) -> Result<Page>;
}

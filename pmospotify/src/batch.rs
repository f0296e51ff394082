//! Chargement complet d'une collection paginée
//!
//! Un premier appel avec `limit = 1` donne la taille totale ; la collection est
//! ensuite découpée en fenêtres de `batch_size` éléments, toutes demandées en
//! parallèle, puis concaténées dans l'ordre des offsets.

use crate::error::{Result, SpotifyError};
use crate::models::{Page, TrackRef};
use crate::paging::PagingClient;
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Taille maximale acceptée pour le `total` annoncé par le service
pub const MAX_COLLECTION_SIZE: usize = 100_000;

/// Paramètres de pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Taille d'une fenêtre, strictement positive
    pub batch_size: usize,
    /// Nombre maximal de fenêtres en vol (`None` : toutes)
    pub max_concurrent_pages: Option<usize>,
    /// Délai maximal d'un appel de page
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_pages: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Découpe `[0, total)` en fenêtres `(offset, limit)` contiguës
pub fn windows(total: usize, batch_size: usize) -> Vec<(usize, usize)> {
    let batch_size = batch_size.max(1);
    (0..total.div_ceil(batch_size))
        .map(|i| {
            let offset = i * batch_size;
            (offset, batch_size.min(total - offset))
        })
        .collect()
}

pub struct BatchFetcher {
    client: Arc<dyn PagingClient>,
    settings: FetchSettings,
}

impl BatchFetcher {
    pub fn new(client: Arc<dyn PagingClient>, settings: FetchSettings) -> Self {
        Self { client, settings }
    }

    /// Charge toute la collection
    ///
    /// Une collection vide ne coûte que l'appel de sondage. L'échec d'une
    /// seule fenêtre fait échouer l'ensemble ; abandonner le future annule
    /// les requêtes en cours.
    pub async fn fetch_all(&self, collection_id: &str) -> Result<Vec<TrackRef>> {
        let probe = self.page(collection_id, 0, 1).await?;
        let total = probe.total;

        if total == 0 {
            debug!(collection = collection_id, "Empty collection");
            return Ok(Vec::new());
        }
        if total > MAX_COLLECTION_SIZE {
            return Err(SpotifyError::fetch_failed(
                collection_id,
                0,
                1,
                format!("announced size {} exceeds {}", total, MAX_COLLECTION_SIZE),
            ));
        }

        let windows = windows(total, self.settings.batch_size);
        let concurrency = self
            .settings
            .max_concurrent_pages
            .unwrap_or(windows.len())
            .max(1);

        debug!(
            collection = collection_id,
            total,
            pages = windows.len(),
            concurrency,
            "Fetching collection"
        );

        // `buffered` rend les pages dans l'ordre des fenêtres
        let pages: Vec<Page> = stream::iter(windows)
            .map(|(offset, limit)| self.page(collection_id, offset, limit))
            .buffered(concurrency)
            .try_collect()
            .await?;

        let mut tracks = Vec::with_capacity(total);
        for page in pages {
            tracks.extend(page.items);
        }

        info!(
            collection = collection_id,
            total,
            received = tracks.len(),
            "Collection fetched"
        );
        Ok(tracks)
    }

    async fn page(&self, collection_id: &str, offset: usize, limit: usize) -> Result<Page> {
        tokio::time::timeout(
            self.settings.request_timeout,
            self.client.fetch_page(collection_id, offset, limit),
        )
        .await
        .map_err(|_| {
            SpotifyError::fetch_failed(
                collection_id,
                offset,
                limit,
                format!("timed out after {:?}", self.settings.request_timeout),
            )
        })?
    }
}

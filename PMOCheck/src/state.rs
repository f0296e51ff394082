//! État partagé des handlers HTTP, construit à partir de la configuration

use crate::sorter::TrackSorter;
use anyhow::Result;
use pmoconfig::Config;
use pmogenre::{GenreClassifier, GenreConfigExt, GenreTaxonomy};
use pmospotify::{
    BatchFetcher, CacheStats, CachedMetadata, MembershipChecker, PlaylistTrackCache, SpotifyApi,
    SpotifyConfigExt,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub checker: MembershipChecker,
    pub sorter: Arc<TrackSorter>,
    /// Cache des métadonnées, pour les statistiques
    metadata: Option<CachedMetadata>,
}

impl AppState {
    pub fn new(
        checker: MembershipChecker,
        sorter: TrackSorter,
        metadata: Option<CachedMetadata>,
    ) -> Self {
        Self {
            checker,
            sorter: Arc::new(sorter),
            metadata,
        }
    }

    /// Assemble le service complet
    ///
    /// # Errors
    ///
    /// Retourne une erreur si une valeur obligatoire manque (credentials,
    /// `spotify.cache.ttl_secs`) ou si une valeur est invalide. Une taxonomie
    /// absente n'est pas une erreur.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ttl = config.get_cache_ttl()?;
        let settings = config.get_fetch_settings()?;
        let stale_policy = config.get_stale_policy()?;
        let api = Arc::new(SpotifyApi::from_config(config)?);

        info!(
            ttl_secs = ttl.as_secs(),
            batch_size = settings.batch_size,
            ?stale_policy,
            "Playlist cache configured"
        );

        let fetcher = BatchFetcher::new(api.clone(), settings);
        let cache = Arc::new(PlaylistTrackCache::new(fetcher, ttl).with_stale_policy(stale_policy));
        let checker = MembershipChecker::new(cache);

        let taxonomy = GenreTaxonomy::load_or_empty(config.get_taxonomy_file());
        let classifier = GenreClassifier::new(Arc::new(taxonomy), config.get_match_policy()?);
        let playlists = config.get_category_playlists()?;

        let metadata = CachedMetadata::new(api, ttl);
        let sorter = TrackSorter::new(
            Arc::new(metadata.clone()),
            classifier,
            playlists,
            checker.clone(),
        );

        Ok(Self::new(checker, sorter, Some(metadata)))
    }

    pub async fn cache_stats(&self) -> CacheStats {
        let playlists = self.checker.cache().stats().await;
        let metadata_entries = match &self.metadata {
            Some(metadata) => metadata.entry_count().await,
            None => 0,
        };
        CacheStats::new(playlists, metadata_entries)
    }
}

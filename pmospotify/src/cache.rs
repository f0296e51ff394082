//! Cache des pistes des playlists
//!
//! Chaque playlist est associée à la liste complète de ses pistes et à
//! l'instant de son chargement. Une entrée est valide tant que
//! `now - fetched_at < ttl` ; au-delà, le prochain accès la recharge via le
//! [`BatchFetcher`].
//!
//! - Une entrée est un instantané : elle est remplacée en bloc, jamais modifiée.
//! - Un seul rechargement à la fois par playlist ; les appelants concurrents
//!   attendent puis lisent l'entrée installée.
//! - Un rechargement raté conserve l'entrée précédente (voir [`StalePolicy`]).
//! - Aucune éviction : la taille du cache croît avec le nombre de playlists
//!   distinctes interrogées, supposé petit.

use crate::batch::BatchFetcher;
use crate::error::{Result, SpotifyError};
use crate::models::{PlaylistStats, TrackRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Comportement quand le rechargement d'une entrée périmée échoue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Le premier échec est remonté ; tant que les rechargements suivants
    /// échouent, la dernière liste connue est servie
    #[default]
    ServeStale,
    /// Chaque échec est remonté (l'entrée reste conservée)
    Strict,
}

impl FromStr for StalePolicy {
    type Err = SpotifyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "serve_stale" | "stale" => Ok(Self::ServeStale),
            "strict" => Ok(Self::Strict),
            _ => Err(SpotifyError::Config(anyhow::anyhow!(
                "Unknown stale policy '{}' (expected serve_stale or strict)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    tracks: Arc<[TrackRef]>,
    fetched_at: Instant,
    /// Le dernier rechargement a échoué
    refresh_failed: bool,
    /// `invalidate()` a été appelé depuis le dernier chargement
    invalidated: bool,
}

impl CacheEntry {
    fn is_valid(&self, ttl: Duration) -> bool {
        !self.invalidated && self.fetched_at.elapsed() < ttl
    }
}

pub struct PlaylistTrackCache {
    fetcher: BatchFetcher,
    ttl: Duration,
    stale_policy: StalePolicy,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Un verrou par playlist, pris uniquement pour recharger
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PlaylistTrackCache {
    pub fn new(fetcher: BatchFetcher, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            stale_policy: StalePolicy::default(),
            entries: RwLock::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }

    /// Retourne les pistes de la playlist, en la rechargeant si nécessaire
    ///
    /// # Errors
    ///
    /// * `SpotifyError::FetchFailed` - le rechargement a échoué et aucune liste
    ///   ne peut être servie à la place
    pub async fn get_tracks(&self, playlist_id: &str) -> Result<Arc<[TrackRef]>> {
        if let Some(tracks) = self.valid_tracks(playlist_id).await {
            debug!(playlist = playlist_id, "Playlist served from cache");
            return Ok(tracks);
        }

        let lock = self.key_lock(playlist_id).await;
        let _guard = lock.lock().await;

        // Un autre appelant a pu recharger pendant l'attente
        if let Some(tracks) = self.valid_tracks(playlist_id).await {
            debug!(playlist = playlist_id, "Playlist loaded by a concurrent caller");
            return Ok(tracks);
        }

        self.load(playlist_id).await
    }

    /// Force le rechargement immédiat de la playlist
    pub async fn refresh(&self, playlist_id: &str) -> Result<Arc<[TrackRef]>> {
        let lock = self.key_lock(playlist_id).await;
        let _guard = lock.lock().await;
        self.load(playlist_id).await
    }

    /// Force le rechargement au prochain accès
    ///
    /// L'entrée est conservée comme repli en cas d'échec.
    pub async fn invalidate(&self, playlist_id: &str) {
        if let Some(entry) = self.entries.write().await.get_mut(playlist_id) {
            debug!(playlist = playlist_id, "Playlist invalidated");
            entry.invalidated = true;
        }
    }

    /// Instant du dernier chargement réussi
    pub async fn fetched_at(&self, playlist_id: &str) -> Option<Instant> {
        self.entries
            .read()
            .await
            .get(playlist_id)
            .map(|entry| entry.fetched_at)
    }

    pub async fn stats(&self) -> PlaylistStats {
        let entries = self.entries.read().await;
        PlaylistStats {
            playlists: entries.len(),
            tracks: entries.values().map(|e| e.tracks.len()).sum(),
            stale_playlists: entries
                .values()
                .filter(|e| e.refresh_failed || !e.is_valid(self.ttl))
                .count(),
        }
    }

    async fn valid_tracks(&self, playlist_id: &str) -> Option<Arc<[TrackRef]>> {
        self.entries
            .read()
            .await
            .get(playlist_id)
            .filter(|entry| entry.is_valid(self.ttl))
            .map(|entry| entry.tracks.clone())
    }

    async fn key_lock(&self, playlist_id: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .lock()
            .await
            .entry(playlist_id.to_string())
            .or_default()
            .clone()
    }

    // Appelé avec le verrou de la playlist
    async fn load(&self, playlist_id: &str) -> Result<Arc<[TrackRef]>> {
        match self.fetcher.fetch_all(playlist_id).await {
            Ok(tracks) => {
                let tracks: Arc<[TrackRef]> = tracks.into();
                info!(
                    playlist = playlist_id,
                    tracks = tracks.len(),
                    "Playlist cached"
                );
                self.entries.write().await.insert(
                    playlist_id.to_string(),
                    CacheEntry {
                        tracks: tracks.clone(),
                        fetched_at: Instant::now(),
                        refresh_failed: false,
                        invalidated: false,
                    },
                );
                Ok(tracks)
            }
            Err(e) => {
                let mut entries = self.entries.write().await;
                let Some(entry) = entries.get_mut(playlist_id) else {
                    warn!(playlist = playlist_id, "Playlist fetch failed: {}", e);
                    return Err(e);
                };

                let serve_stale =
                    entry.refresh_failed && self.stale_policy == StalePolicy::ServeStale;
                entry.refresh_failed = true;

                if serve_stale {
                    warn!(
                        playlist = playlist_id,
                        "Refresh failed again, serving stale playlist: {}", e
                    );
                    Ok(entry.tracks.clone())
                } else {
                    warn!(
                        playlist = playlist_id,
                        "Refresh failed, keeping previous playlist: {}", e
                    );
                    Err(e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FetchSettings;
    use crate::testing::{FakePlaylists, tracks};

    const TTL: Duration = Duration::from_secs(60);

    fn cache(fake: &Arc<FakePlaylists>) -> PlaylistTrackCache {
        PlaylistTrackCache::new(
            BatchFetcher::new(fake.clone(), FetchSettings::default()),
            TTL,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_reads_within_ttl_fetch_once() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1", "t2"])));
        let cache = cache(&fake);

        let first = cache.get_tracks("p").await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = cache.get_tracks("p").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fake.probes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_ttl_refetches() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1", "t2"])));
        let cache = cache(&fake);

        cache.get_tracks("p").await.unwrap();
        let first_fetch = cache.fetched_at("p").await.unwrap();

        fake.set_playlist("p", tracks(&["t1", "t2", "t3"]));
        tokio::time::advance(TTL).await;
        let refreshed = cache.get_tracks("p").await.unwrap();

        assert_eq!(refreshed.len(), 3);
        assert_eq!(fake.probes(), 2);
        assert!(cache.fetched_at("p").await.unwrap() > first_fetch);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_list() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1", "t2", "t3"])));
        let cache = cache(&fake);

        let original = cache.get_tracks("p").await.unwrap();
        let fetched_at = cache.fetched_at("p").await.unwrap();

        tokio::time::advance(TTL).await;
        fake.set_failing(true);

        // L'appel dont le rechargement échoue remonte l'erreur...
        tokio_test::assert_err!(cache.get_tracks("p").await);
        // ...les suivants servent la dernière liste connue
        let served = cache.get_tracks("p").await.unwrap();
        assert_eq!(served, original);
        assert_eq!(cache.fetched_at("p").await.unwrap(), fetched_at);

        // Un rechargement réussi remplace l'entrée
        fake.set_failing(false);
        fake.set_playlist("p", tracks(&["t9"]));
        let replaced = cache.get_tracks("p").await.unwrap();
        assert_eq!(&*replaced, tracks(&["t9"]).as_slice());
        assert!(cache.fetched_at("p").await.unwrap() > fetched_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strict_policy_always_errors() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1"])));
        let cache = cache(&fake).with_stale_policy(StalePolicy::Strict);

        cache.get_tracks("p").await.unwrap();
        tokio::time::advance(TTL).await;
        fake.set_failing(true);

        tokio_test::assert_err!(cache.get_tracks("p").await);
        tokio_test::assert_err!(cache.get_tracks("p").await);

        let stats = cache.stats().await;
        assert_eq!(stats.playlists, 1);
        assert_eq!(stats.tracks, 1);
        assert_eq!(stats.stale_playlists, 1);
    }

    #[tokio::test]
    async fn test_first_fetch_failure_leaves_no_entry() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1"])));
        fake.set_failing(true);
        let cache = cache(&fake);

        let err = cache.get_tracks("p").await.unwrap_err();
        assert!(matches!(err, SpotifyError::FetchFailed { .. }));
        assert_eq!(cache.stats().await.playlists, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1", "t2"])));
        fake.set_delay(0, Duration::from_millis(100));
        let cache = Arc::new(cache(&fake));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_tracks("p").await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 2);
        }
        assert_eq!(fake.probes(), 1);
    }

    #[tokio::test]
    async fn test_different_playlists_are_independent() {
        let fake = Arc::new(FakePlaylists::with_playlist("a", tracks(&["t1"])));
        fake.set_playlist("b", tracks(&["t2", "t3"]));
        let cache = cache(&fake);

        let (a, b) = tokio::join!(cache.get_tracks("a"), cache.get_tracks("b"));
        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 2);
        assert_eq!(cache.stats().await.tracks, 3);
    }

    #[tokio::test]
    async fn test_invalidate_and_refresh() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1", "t2"])));
        let cache = cache(&fake);

        cache.get_tracks("p").await.unwrap();
        cache.invalidate("p").await;
        fake.set_playlist("p", tracks(&["t1", "t2", "t3"]));
        assert_eq!(cache.get_tracks("p").await.unwrap().len(), 3);
        assert_eq!(fake.probes(), 2);

        fake.set_playlist("p", tracks(&["t4", "t5"]));
        assert_eq!(cache.refresh("p").await.unwrap().len(), 2);
        assert_eq!(fake.probes(), 3);

        // Lecture suivante servie par le cache
        cache.get_tracks("p").await.unwrap();
        assert_eq!(fake.probes(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_load_releases_the_playlist() {
        let fake = Arc::new(FakePlaylists::with_playlist("p", tracks(&["t1", "t2", "t3"])));
        fake.set_delay(1, Duration::from_secs(10));
        let settings = FetchSettings {
            batch_size: 1,
            ..FetchSettings::default()
        };
        let cache = Arc::new(PlaylistTrackCache::new(
            BatchFetcher::new(fake.clone(), settings),
            TTL,
        ));

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_tracks("p").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fake.in_flight(), 1);

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        assert_eq!(fake.in_flight(), 0);
        assert_eq!(cache.stats().await.playlists, 0);

        // Le verrou de la playlist est libre : un nouvel appel aboutit
        fake.set_delay(1, Duration::ZERO);
        let loaded = tokio::time::timeout(Duration::from_secs(1), cache.get_tracks("p"))
            .await
            .expect("playlist lock still held")
            .unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_stale_policy_from_str() {
        assert_eq!("serve_stale".parse::<StalePolicy>().unwrap(), StalePolicy::ServeStale);
        assert_eq!("Strict".parse::<StalePolicy>().unwrap(), StalePolicy::Strict);
        assert!("lenient".parse::<StalePolicy>().is_err());
    }
}

//! Source paginée en mémoire pour les tests

use crate::error::{Result, SpotifyError};
use crate::models::{Page, TrackRef};
use crate::paging::PagingClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn tracks(ids: &[&str]) -> Vec<TrackRef> {
    ids.iter()
        .map(|id| TrackRef::new(*id, format!("spotify:track:{}", id)))
        .collect()
}

pub(crate) fn numbered_tracks(count: usize) -> Vec<TrackRef> {
    (0..count)
        .map(|i| TrackRef::new(format!("t{}", i), format!("spotify:track:t{}", i)))
        .collect()
}

#[derive(Default)]
pub(crate) struct FakePlaylists {
    playlists: Mutex<HashMap<String, Vec<TrackRef>>>,
    /// Délai de réponse par offset
    delays: Mutex<HashMap<usize, Duration>>,
    calls: Mutex<Vec<(String, usize, usize)>>,
    failing: AtomicBool,
    fail_offset: Mutex<Option<usize>>,
    /// `total` annoncé à la place de la taille réelle
    reported_total: Mutex<Option<usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Décrémente le compteur d'appels en vol, y compris quand le future est abandonné
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakePlaylists {
    pub(crate) fn with_playlist(id: &str, tracks: Vec<TrackRef>) -> Self {
        let fake = Self::default();
        fake.set_playlist(id, tracks);
        fake
    }

    pub(crate) fn set_playlist(&self, id: &str, tracks: Vec<TrackRef>) {
        self.playlists
            .lock()
            .unwrap()
            .insert(id.to_string(), tracks);
    }

    pub(crate) fn set_delay(&self, offset: usize, delay: Duration) {
        self.delays.lock().unwrap().insert(offset, delay);
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn fail_at(&self, offset: usize) {
        *self.fail_offset.lock().unwrap() = Some(offset);
    }

    pub(crate) fn report_total(&self, total: usize) {
        *self.reported_total.lock().unwrap() = Some(total);
    }

    /// Appels reçus `(collection_id, offset, limit)`, dans l'ordre d'arrivée
    pub(crate) fn calls(&self) -> Vec<(String, usize, usize)> {
        self.calls.lock().unwrap().clone()
    }

    /// Nombre de sondages (`limit == 1` à l'offset 0), soit un par chargement complet
    ///
    /// Pour une playlist d'une seule piste, la fenêtre unique est aussi `(0, 1)` :
    /// les tests qui comptent les chargements utilisent au moins deux pistes.
    pub(crate) fn probes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|(_, offset, limit)| *offset == 0 && *limit == 1)
            .count()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PagingClient for FakePlaylists {
    async fn fetch_page(&self, collection_id: &str, offset: usize, limit: usize) -> Result<Page> {
        self.calls
            .lock()
            .unwrap()
            .push((collection_id.to_string(), offset, limit));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        let delay = self.delays.lock().unwrap().get(&offset).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        drop(guard);

        let fail_offset = *self.fail_offset.lock().unwrap();
        if self.failing.load(Ordering::SeqCst) || fail_offset == Some(offset) {
            return Err(SpotifyError::fetch_failed(
                collection_id,
                offset,
                limit,
                "simulated failure",
            ));
        }

        let playlists = self.playlists.lock().unwrap();
        let all = playlists.get(collection_id).cloned().unwrap_or_default();
        let items = all.iter().skip(offset).take(limit).cloned().collect();
        let total = self.reported_total.lock().unwrap().unwrap_or(all.len());
        Ok(Page { items, total })
    }
}

//! Catalogue en mémoire pour les tests des routes et du tri

use crate::sorter::TrackSorter;
use crate::state::AppState;
use async_trait::async_trait;
use indexmap::IndexMap;
use pmogenre::{GenreClassifier, GenreTaxonomy, MatchPolicy};
use pmospotify::{
    BatchFetcher, CachedMetadata, FetchSettings, MembershipChecker, MetadataSource, Page, PagingClient,
    PlaylistTrackCache, Result, SpotifyError, TrackMetadata, TrackRef,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TAXONOMY: &str = "
genres:
  deep house: [house, dance]
  ambient: [chill]
categories:
  dance: [dance music, house]
  chill: [chillout]
";

pub(crate) struct FakeCatalog {
    playlists: HashMap<String, Vec<String>>,
    genres: HashMap<String, Vec<String>>,
}

impl FakeCatalog {
    /// - `both` est dans les deux playlists, `first` dans dance, `second` dans chill
    /// - `none` est classée dance mais absente partout, `polka` n'est pas classée
    /// - la playlist `broken` est illisible, `ghost` est une piste inconnue
    pub(crate) fn standard() -> Arc<Self> {
        let list = |ids: &[&str]| ids.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let playlists = HashMap::from([
            ("p-dance".to_string(), list(&["both", "first", "x1"])),
            ("p-chill".to_string(), list(&["both", "second"])),
        ]);
        let genres = HashMap::from([
            ("both".to_string(), list(&["Deep House", "ambient"])),
            ("first".to_string(), list(&["deep house", "ambient"])),
            ("second".to_string(), list(&["deep house", "ambient"])),
            ("none".to_string(), list(&["deep house"])),
            ("polka".to_string(), list(&["polka"])),
        ]);

        Arc::new(Self { playlists, genres })
    }

    pub(crate) fn sorter(self: &Arc<Self>, policy: MatchPolicy) -> TrackSorter {
        self.build(policy).1
    }

    pub(crate) fn state(self: &Arc<Self>, policy: MatchPolicy) -> AppState {
        let (checker, sorter) = self.build(policy);
        AppState::new(checker, sorter, None)
    }

    pub(crate) fn state_with_metadata(
        self: &Arc<Self>,
        policy: MatchPolicy,
        metadata: CachedMetadata,
    ) -> AppState {
        let (checker, sorter) = self.build(policy);
        AppState::new(checker, sorter, Some(metadata))
    }

    fn build(self: &Arc<Self>, policy: MatchPolicy) -> (MembershipChecker, TrackSorter) {
        let fetcher = BatchFetcher::new(self.clone(), FetchSettings::default());
        let cache = Arc::new(PlaylistTrackCache::new(fetcher, Duration::from_secs(60)));
        let checker = MembershipChecker::new(cache);

        let taxonomy = GenreTaxonomy::from_yaml_str(TAXONOMY).unwrap();
        let classifier = GenreClassifier::new(Arc::new(taxonomy), policy);
        let playlists = IndexMap::from([
            ("dance".to_string(), "p-dance".to_string()),
            ("chill".to_string(), "p-chill".to_string()),
        ]);

        let sorter = TrackSorter::new(self.clone(), classifier, playlists, checker.clone());
        (checker, sorter)
    }
}

#[async_trait]
impl PagingClient for FakeCatalog {
    async fn fetch_page(&self, collection_id: &str, offset: usize, limit: usize) -> Result<Page> {
        if collection_id == "broken" {
            return Err(SpotifyError::fetch_failed(
                collection_id,
                offset,
                limit,
                "upstream body: internal-detail",
            ));
        }
        let ids = self.playlists.get(collection_id).cloned().unwrap_or_default();
        let items = ids
            .iter()
            .skip(offset)
            .take(limit)
            .map(|id| TrackRef::new(id.clone(), format!("spotify:track:{}", id)))
            .collect();
        Ok(Page {
            items,
            total: ids.len(),
        })
    }
}

#[async_trait]
impl MetadataSource for FakeCatalog {
    async fn track_metadata(&self, track_id: &str) -> Result<TrackMetadata> {
        let genres = self
            .genres
            .get(track_id)
            .cloned()
            .ok_or_else(|| SpotifyError::TrackNotFound(track_id.to_string()))?;
        Ok(TrackMetadata {
            id: track_id.to_string(),
            name: format!("Song {}", track_id),
            uri: format!("spotify:track:{}", track_id),
            album_id: None,
            artist_ids: vec![],
            genres,
        })
    }
}

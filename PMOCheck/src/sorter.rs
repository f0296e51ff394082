//! Classement d'une piste et vérification de sa présence dans les playlists
//! de ses catégories

use futures::future::try_join_all;
use indexmap::IndexMap;
use pmogenre::GenreClassifier;
use pmospotify::{MembershipChecker, MetadataSource, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Présence de la piste dans les playlists des deux premières catégories
/// déclarées (A puis B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Both,
    FirstOnly,
    SecondOnly,
    Neither,
}

/// Une catégorie retenue pour la piste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Placement {
    pub category: String,
    /// `None` si aucune playlist n'est configurée pour la catégorie
    pub playlist_id: Option<String>,
    /// La playlist contient déjà la piste
    pub present: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SortReport {
    pub track_id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub placements: Vec<Placement>,
    pub outcome: Outcome,
}

pub struct TrackSorter {
    metadata: Arc<dyn MetadataSource>,
    classifier: GenreClassifier,
    /// catégorie → identifiant de playlist
    playlists: IndexMap<String, String>,
    checker: MembershipChecker,
}

impl TrackSorter {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        classifier: GenreClassifier,
        playlists: IndexMap<String, String>,
        checker: MembershipChecker,
    ) -> Self {
        for category in classifier.taxonomy().category_names() {
            if !playlists.contains_key(&category) {
                warn!(category = %category, "No playlist configured for category");
            }
        }

        Self {
            metadata,
            classifier,
            playlists,
            checker,
        }
    }

    /// Classe la piste puis vérifie, en parallèle, sa présence dans la
    /// playlist de chacune de ses catégories
    ///
    /// # Errors
    ///
    /// * `SpotifyError::TrackNotFound` - piste inconnue du catalogue
    /// * `SpotifyError::FetchFailed` / `AuthFailed` - une playlist n'a pas pu être lue
    pub async fn sort_and_check(&self, track_id: &str) -> Result<SortReport> {
        let metadata = self.metadata.track_metadata(track_id).await?;
        let classification = self.classifier.classify(&metadata.genres);

        let placements = try_join_all(classification.iter().map(|category| async move {
            let playlist_id = self.playlists.get(category).cloned();
            let present = match &playlist_id {
                Some(playlist_id) => self.checker.is_member(track_id, playlist_id).await?,
                None => false,
            };
            Ok::<_, pmospotify::SpotifyError>(Placement {
                category: category.to_string(),
                playlist_id,
                present,
            })
        }))
        .await?;

        let outcome = self.outcome(&placements);
        info!(
            track = track_id,
            categories = placements.len(),
            ?outcome,
            "Track sorted"
        );

        Ok(SortReport {
            track_id: metadata.id,
            name: metadata.name,
            genres: metadata.genres,
            placements,
            outcome,
        })
    }

    fn outcome(&self, placements: &[Placement]) -> Outcome {
        let names = self.classifier.taxonomy().category_names();
        let present_in = |index: usize| {
            names.get(index).is_some_and(|name| {
                placements
                    .iter()
                    .any(|placement| &placement.category == name && placement.present)
            })
        };

        match (present_in(0), present_in(1)) {
            (true, true) => Outcome::Both,
            (true, false) => Outcome::FirstOnly,
            (false, true) => Outcome::SecondOnly,
            (false, false) => Outcome::Neither,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCatalog;
    use pmospotify::SpotifyError;

    #[tokio::test]
    async fn test_placements_follow_classification() {
        let catalog = FakeCatalog::standard();
        let sorter = catalog.sorter(pmogenre::MatchPolicy::AllMatches);

        let report = sorter.sort_and_check("both").await.unwrap();
        assert_eq!(report.outcome, Outcome::Both);
        assert_eq!(
            report.placements,
            vec![
                Placement {
                    category: "dance".to_string(),
                    playlist_id: Some("p-dance".to_string()),
                    present: true,
                },
                Placement {
                    category: "chill".to_string(),
                    playlist_id: Some("p-chill".to_string()),
                    present: true,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_first_match_only_checks_first_category() {
        let catalog = FakeCatalog::standard();
        let sorter = catalog.sorter(pmogenre::MatchPolicy::FirstMatch);

        let report = sorter.sort_and_check("both").await.unwrap();
        assert_eq!(report.placements.len(), 1);
        assert_eq!(report.outcome, Outcome::FirstOnly);
    }

    #[tokio::test]
    async fn test_unclassified_track_is_neither() {
        let catalog = FakeCatalog::standard();
        let sorter = catalog.sorter(pmogenre::MatchPolicy::AllMatches);

        let report = sorter.sort_and_check("polka").await.unwrap();
        assert!(report.placements.is_empty());
        assert_eq!(report.outcome, Outcome::Neither);
    }

    #[tokio::test]
    async fn test_unknown_track() {
        let catalog = FakeCatalog::standard();
        let sorter = catalog.sorter(pmogenre::MatchPolicy::AllMatches);

        assert!(matches!(
            sorter.sort_and_check("ghost").await,
            Err(SpotifyError::TrackNotFound(_))
        ));
    }
}

//! Routes HTTP de PMOCheck
//!
//! | Route | Réponses |
//! |---|---|
//! | `GET /checkSong?playlistId=&trackId=` | 200 présente, 404 absente, 400 paramètre manquant |
//! | `GET /sort-and-check-track?trackId=` | 200 A et B, 201 A seule, 202 B seule, 204 aucune |
//! | `GET /cache/stats` | statistiques des caches |

use crate::sorter::{Outcome, Placement, SortReport};
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use pmospotify::{CacheStats, SpotifyError};
use serde::Deserialize;
use tracing::{debug, warn};
use utoipa::{IntoParams, OpenApi};

/// Préfixe des URI de pistes Spotify
const TRACK_URI_PREFIX: &str = "spotify:track:";

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CheckSongParams {
    /// Identifiant de la playlist
    pub playlist_id: Option<String>,
    /// Identifiant de la piste
    pub track_id: Option<String>,
    /// Ancienne forme : `spotify:track:<id>`
    pub song_uri: Option<String>,
}

impl CheckSongParams {
    fn track_id(&self) -> Option<String> {
        non_empty(&self.track_id).or_else(|| {
            non_empty(&self.song_uri).map(|uri| {
                uri.strip_prefix(TRACK_URI_PREFIX)
                    .unwrap_or(&uri)
                    .to_string()
            })
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SortParams {
    /// Identifiant de la piste
    pub track_id: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Erreur API
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Spotify(SpotifyError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Spotify(e @ SpotifyError::TrackNotFound(_)) => {
                (StatusCode::NOT_FOUND, e.public_message())
            }
            AppError::Spotify(e) => {
                // Le détail complet reste dans les logs
                warn!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.public_message())
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<SpotifyError> for AppError {
    fn from(err: SpotifyError) -> Self {
        Self::Spotify(err)
    }
}

/// GET /checkSong - La playlist contient-elle la piste ?
#[utoipa::path(
    get,
    path = "/checkSong",
    tag = "check",
    params(CheckSongParams),
    responses(
        (status = 200, description = "La piste est dans la playlist"),
        (status = 404, description = "La piste n'est pas dans la playlist"),
        (status = 400, description = "Paramètre manquant"),
        (status = 500, description = "La playlist n'a pas pu être lue")
    )
)]
pub async fn check_song(
    State(state): State<AppState>,
    Query(params): Query<CheckSongParams>,
) -> Result<StatusCode, AppError> {
    let playlist_id = non_empty(&params.playlist_id)
        .ok_or_else(|| AppError::BadRequest("Missing playlistId".to_string()))?;
    let track_id = params
        .track_id()
        .ok_or_else(|| AppError::BadRequest("Missing trackId".to_string()))?;

    if state.checker.is_member(&track_id, &playlist_id).await? {
        Ok(StatusCode::OK)
    } else {
        debug!(track = %track_id, playlist = %playlist_id, "Track not in playlist");
        Ok(StatusCode::NOT_FOUND)
    }
}

/// GET /sort-and-check-track - Catégories de la piste et présence dans leurs playlists
#[utoipa::path(
    get,
    path = "/sort-and-check-track",
    tag = "check",
    params(SortParams),
    responses(
        (status = 200, description = "Présente dans les playlists des catégories A et B", body = SortReport),
        (status = 201, description = "Présente dans la playlist de la catégorie A seulement", body = SortReport),
        (status = 202, description = "Présente dans la playlist de la catégorie B seulement", body = SortReport),
        (status = 204, description = "Présente dans aucune des deux"),
        (status = 400, description = "trackId manquant"),
        (status = 404, description = "Piste inconnue du catalogue"),
        (status = 500, description = "Erreur du catalogue")
    )
)]
pub async fn sort_and_check_track(
    State(state): State<AppState>,
    Query(params): Query<SortParams>,
) -> Result<Response, AppError> {
    let track_id = non_empty(&params.track_id)
        .ok_or_else(|| AppError::BadRequest("Missing trackId".to_string()))?;

    let report = state.sorter.sort_and_check(&track_id).await?;

    let status = match report.outcome {
        Outcome::Both => StatusCode::OK,
        Outcome::FirstOnly => StatusCode::CREATED,
        Outcome::SecondOnly => StatusCode::ACCEPTED,
        Outcome::Neither => return Ok(StatusCode::NO_CONTENT.into_response()),
    };

    Ok((status, Json(report)).into_response())
}

/// GET /cache/stats - Statistiques des caches
#[utoipa::path(
    get,
    path = "/cache/stats",
    tag = "cache",
    responses(
        (status = 200, description = "Statistiques des caches", body = CacheStats)
    )
)]
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache_stats().await)
}

/// Crée le router de l'application
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/checkSong", get(check_song))
        .route("/sort-and-check-track", get(sort_and_check_track))
        .route("/cache/stats", get(cache_stats))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PMOCheck API",
        version = "0.1.0",
        description = "Appartenance des pistes aux playlists et tri par genre"
    ),
    paths(check_song, sort_and_check_track, cache_stats),
    components(schemas(SortReport, Placement, Outcome, CacheStats)),
    tags(
        (name = "check", description = "Appartenance et tri des pistes"),
        (name = "cache", description = "Observation des caches")
    )
)]
pub struct ApiDoc;

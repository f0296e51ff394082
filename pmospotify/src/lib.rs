//! # pmospotify - Playlists Spotify en cache
//!
//! Cette crate répond à la question « la playlist P contient-elle la piste T ? »
//! sans relire toute la playlist à chaque requête.
//!
//! ## Architecture
//!
//! - [`PagingClient`] : source paginée (implémentée par [`SpotifyApi`])
//! - [`BatchFetcher`] : sondage, découpage en fenêtres, chargement parallèle ordonné
//! - [`PlaylistTrackCache`] : cache TTL par playlist, un seul rechargement à la fois
//! - [`MembershipChecker`] : test d'appartenance via le cache
//! - [`MetadataSource`] / [`CachedMetadata`] : genres d'une piste (album et artistes)
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pmospotify::{
//!     BatchFetcher, ClientCredentials, FetchSettings, MembershipChecker, PlaylistTrackCache,
//!     SpotifyApi,
//! };
//!
//! #[tokio::main]
//! async fn main() -> pmospotify::Result<()> {
//!     let credentials = ClientCredentials::new(pmospotify::api::auth::TOKEN_URL, "id", "secret");
//!     let api = Arc::new(SpotifyApi::new(credentials)?);
//!
//!     let fetcher = BatchFetcher::new(api, FetchSettings::default());
//!     let cache = Arc::new(PlaylistTrackCache::new(fetcher, Duration::from_secs(3600)));
//!     let checker = MembershipChecker::new(cache);
//!
//!     let present = checker.is_member("4uLU6hMCjMI75M1A2tKUQC", "37i9dQZF1DXcBWIGoYBM5M").await?;
//!     println!("present: {}", present);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod batch;
pub mod cache;
pub mod config_ext;
pub mod error;
pub mod membership;
pub mod metadata;
pub mod models;
pub mod paging;

#[cfg(test)]
mod testing;

pub use api::{ClientCredentials, SpotifyApi};
pub use batch::{BatchFetcher, FetchSettings};
pub use cache::{PlaylistTrackCache, StalePolicy};
pub use config_ext::SpotifyConfigExt;
pub use error::{Result, SpotifyError};
pub use membership::MembershipChecker;
pub use metadata::{CachedMetadata, MetadataSource};
pub use models::{CacheStats, Page, PlaylistStats, TrackMetadata, TrackRef};
pub use paging::PagingClient;

//! # pmogenre - Classification des pistes par genre
//!
//! Cette crate associe les tags de genre d'une piste (tels que fournis par le
//! catalogue pour l'album et les artistes) aux catégories de playlists
//! configurées.
//!
//! ## Exemple
//!
//! ```rust
//! use std::sync::Arc;
//! use pmogenre::{GenreClassifier, GenreTaxonomy, MatchPolicy};
//!
//! let taxonomy = GenreTaxonomy::from_yaml_str(
//!     "genres:\n  deep house: [house, dance]\ncategories:\n  dance: [dance music]\n",
//! )?;
//! let classifier = GenreClassifier::new(Arc::new(taxonomy), MatchPolicy::FirstMatch);
//!
//! assert!(classifier.classify(["deep house"]).contains("dance"));
//! # Ok::<(), pmogenre::GenreError>(())
//! ```

pub mod classifier;
pub mod config_ext;
pub mod error;
pub mod taxonomy;

pub use classifier::{Classification, GenreClassifier, MatchPolicy};
pub use config_ext::GenreConfigExt;
pub use error::{GenreError, Result};
pub use taxonomy::GenreTaxonomy;

//! Taxonomie des genres
//!
//! Deux tables en lecture seule, chargées une fois au démarrage :
//!
//! - `genres` : tag de genre brut → mots-clés
//! - `categories` : nom de catégorie → mots-clés acceptés, dans l'ordre de déclaration
//!
//! Toutes les clés et tous les mots-clés sont normalisés en minuscules.
//!
//! ```yaml
//! genres:
//!   deep house: [house, dance]
//!   techno: [techno, electronic]
//! categories:
//!   dance: [dance music, electro house]
//!   chill: [chillout, lounge]
//! ```

use crate::error::{GenreError, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Forme brute du fichier, avant normalisation
#[derive(Debug, Default, Deserialize)]
struct RawTaxonomy {
    #[serde(default)]
    genres: HashMap<String, Vec<String>>,
    #[serde(default)]
    categories: IndexMap<String, Vec<String>>,
}

/// Taxonomie normalisée
#[derive(Debug, Clone, Default)]
pub struct GenreTaxonomy {
    genres: HashMap<String, Vec<String>>,
    categories: IndexMap<String, Vec<String>>,
}

impl GenreTaxonomy {
    /// Construit une taxonomie à partir de ses deux tables
    ///
    /// Les clés qui ne diffèrent que par la casse sont fusionnées, la première
    /// occurrence fixant la position d'une catégorie.
    pub fn new<G, C>(genres: G, categories: C) -> Self
    where
        G: IntoIterator<Item = (String, Vec<String>)>,
        C: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut normalized_genres: HashMap<String, Vec<String>> = HashMap::new();
        for (tag, keywords) in genres {
            let slot = normalized_genres.entry(normalize(&tag)).or_default();
            push_keywords(slot, keywords);
        }

        let mut normalized_categories: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, keywords) in categories {
            let slot = normalized_categories.entry(normalize(&name)).or_default();
            push_keywords(slot, keywords);
        }

        Self {
            genres: normalized_genres,
            categories: normalized_categories,
        }
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let raw: RawTaxonomy = serde_yaml::from_str(data)?;
        Ok(Self::new(raw.genres, raw.categories))
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let raw: RawTaxonomy = serde_json::from_str(data)?;
        Ok(Self::new(raw.genres, raw.categories))
    }

    /// Charge un fichier de taxonomie
    ///
    /// Le format est choisi d'après l'extension : `.json` pour JSON, YAML sinon.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| GenreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&data)
        } else {
            Self::from_yaml_str(&data)
        }
    }

    /// Charge un fichier de taxonomie en mode dégradé
    ///
    /// Un fichier absent ou invalide est signalé dans les logs et donne une
    /// taxonomie vide : aucune piste ne sera classée.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(taxonomy) => {
                info!(
                    path = %path.display(),
                    genres = taxonomy.genres.len(),
                    categories = taxonomy.categories.len(),
                    "Genre taxonomy loaded"
                );
                taxonomy
            }
            Err(e) => {
                warn!(path = %path.display(), "Using empty genre taxonomy: {}", e);
                Self::default()
            }
        }
    }

    /// Mots-clés associés à un tag de genre (insensible à la casse)
    pub fn keywords_for(&self, tag: &str) -> Option<&[String]> {
        self.genres.get(&normalize(tag)).map(Vec::as_slice)
    }

    /// Catégories et leurs mots-clés, dans l'ordre de déclaration
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, keywords)| (name.as_str(), keywords.as_slice()))
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.categories.is_empty()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

// Un mot-clé vide serait contenu dans toutes les chaînes
fn push_keywords(slot: &mut Vec<String>, keywords: Vec<String>) {
    for keyword in keywords {
        let keyword = normalize(&keyword);
        if !keyword.is_empty() && !slot.contains(&keyword) {
            slot.push(keyword);
        }
    }
}

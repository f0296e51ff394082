//! Extension pour lire la configuration des genres depuis pmoconfig
//!
//! ```yaml
//! genres:
//!   taxonomy_file: genres.yaml
//!   policy: first_match
//!   playlists:
//!     dance: 37i9dQZF1DX0BcQWzuB7ZO
//!     chill: 37i9dQZF1DX4WYpdgoIcn6
//! ```

use crate::classifier::MatchPolicy;
use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use pmoconfig::Config;
use serde_yaml::Value;
use std::path::PathBuf;

const DEFAULT_TAXONOMY_FILE: &str = "genres.yaml";

/// Trait d'extension pour la configuration de la classification
pub trait GenreConfigExt {
    /// Chemin du fichier de taxonomie, résolu depuis le répertoire de configuration
    fn get_taxonomy_file(&self) -> PathBuf;

    /// Politique de classification (`first_match` par défaut)
    ///
    /// # Errors
    ///
    /// Retourne une erreur si la valeur configurée est inconnue
    fn get_match_policy(&self) -> Result<MatchPolicy>;

    /// Identifiant de playlist de chaque catégorie (`genres.playlists`)
    fn get_category_playlists(&self) -> Result<IndexMap<String, String>>;
}

impl GenreConfigExt for Config {
    fn get_taxonomy_file(&self) -> PathBuf {
        let file = self
            .get_string(&["genres", "taxonomy_file"])
            .unwrap_or_else(|| DEFAULT_TAXONOMY_FILE.to_string());
        self.resolve_path(file)
    }

    fn get_match_policy(&self) -> Result<MatchPolicy> {
        match self.get_string(&["genres", "policy"]) {
            Some(policy) => Ok(policy.parse()?),
            None => Ok(MatchPolicy::default()),
        }
    }

    fn get_category_playlists(&self) -> Result<IndexMap<String, String>> {
        let mapping = match self.get_value(&["genres", "playlists"]) {
            Ok(Value::Mapping(mapping)) => mapping,
            Ok(Value::Null) | Err(_) => return Ok(IndexMap::new()),
            Ok(_) => return Err(anyhow!("genres.playlists must be a mapping")),
        };

        let mut playlists = IndexMap::new();
        for (key, value) in mapping {
            let category = key
                .as_str()
                .ok_or_else(|| anyhow!("genres.playlists keys must be category names"))?
                .to_lowercase();
            let playlist_id = match value {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return Err(anyhow!("genres.playlists.{} must be a playlist id", category)),
            };
            playlists.insert(category, playlist_id);
        }
        Ok(playlists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(external: Option<&str>) -> Config {
        Config::from_parts("/etc/pmocheck", external, Vec::<(String, String)>::new()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config(None);
        assert_eq!(config.get_taxonomy_file(), PathBuf::from("/etc/pmocheck/genres.yaml"));
        assert_eq!(config.get_match_policy().unwrap(), MatchPolicy::FirstMatch);
        assert!(config.get_category_playlists().unwrap().is_empty());
    }

    #[test]
    fn test_configured_values() {
        let config = config(Some(
            "genres:\n  taxonomy_file: /srv/genres.json\n  policy: all_matches\n  playlists:\n    Dance: p-dance\n    chill: p-chill\n",
        ));
        assert_eq!(config.get_taxonomy_file(), PathBuf::from("/srv/genres.json"));
        assert_eq!(config.get_match_policy().unwrap(), MatchPolicy::AllMatches);

        let playlists = config.get_category_playlists().unwrap();
        assert_eq!(playlists.get("dance").map(String::as_str), Some("p-dance"));
        assert_eq!(playlists.get("chill").map(String::as_str), Some("p-chill"));
    }

    #[test]
    fn test_invalid_policy_is_an_error() {
        let config = config(Some("genres:\n  policy: random\n"));
        assert!(config.get_match_policy().is_err());
    }
}

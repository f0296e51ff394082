//! Classification d'une piste dans les catégories de playlists
//!
//! 1. les tags bruts sont passés en minuscules ;
//! 2. chaque tag connu de la taxonomie est remplacé par ses mots-clés (les tags
//!    inconnus ne contribuent à rien) ;
//! 3. une catégorie correspond si l'un de ses mots-clés contient l'un des
//!    mots-clés obtenus (`category_keyword.contains(keyword)`).

use crate::error::GenreError;
use crate::taxonomy::GenreTaxonomy;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Politique de sélection lorsque plusieurs catégories correspondent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Seule la première catégorie déclarée qui correspond est retenue
    #[default]
    FirstMatch,
    /// Toutes les catégories qui correspondent sont retenues
    AllMatches,
}

impl FromStr for MatchPolicy {
    type Err = GenreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first_match" | "first" => Ok(Self::FirstMatch),
            "all_matches" | "all" => Ok(Self::AllMatches),
            _ => Err(GenreError::InvalidPolicy(s.to_string())),
        }
    }
}

/// Ensemble ordonné des catégories retenues pour une piste
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Classification(IndexSet<String>);

impl Classification {
    pub fn contains(&self, category: &str) -> bool {
        self.0.contains(category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a Classification {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone)]
pub struct GenreClassifier {
    taxonomy: Arc<GenreTaxonomy>,
    policy: MatchPolicy,
}

impl GenreClassifier {
    pub fn new(taxonomy: Arc<GenreTaxonomy>, policy: MatchPolicy) -> Self {
        Self { taxonomy, policy }
    }

    pub fn taxonomy(&self) -> &GenreTaxonomy {
        &self.taxonomy
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Classe une piste d'après ses tags de genre bruts
    pub fn classify<I, S>(&self, raw_tags: I) -> Classification
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut expanded: IndexSet<&str> = IndexSet::new();
        for tag in raw_tags {
            let tag = tag.as_ref().to_lowercase();
            if let Some(keywords) = self.taxonomy.keywords_for(&tag) {
                expanded.extend(keywords.iter().map(String::as_str));
            }
        }

        let mut result = IndexSet::new();
        if expanded.is_empty() {
            return Classification(result);
        }

        for (category, category_keywords) in self.taxonomy.categories() {
            let matched = category_keywords
                .iter()
                .any(|ck| expanded.iter().any(|kw| ck.contains(kw)));

            if matched {
                result.insert(category.to_string());
                if self.policy == MatchPolicy::FirstMatch {
                    break;
                }
            }
        }

        debug!(keywords = ?expanded, categories = ?result, "Track classified");
        Classification(result)
    }
}

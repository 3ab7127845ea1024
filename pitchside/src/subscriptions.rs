use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::storage::SubscriptionStorage;

/// The four subscription buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    League,
    Team,
    Player,
    Tournament,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::League,
        Category::Team,
        Category::Player,
        Category::Tournament,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::League => "league",
            Category::Team => "team",
            Category::Player => "player",
            Category::Tournament => "tournament",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = StoreError;

    /// Case-insensitive; the plural collection names are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "league" | "leagues" => Ok(Category::League),
            "team" | "teams" => Ok(Category::Team),
            "player" | "players" => Ok(Category::Player),
            "tournament" | "tournaments" => Ok(Category::Tournament),
            _ => Err(StoreError::InvalidCategory(s.to_string())),
        }
    }
}

/// Persisted mapping category -> ordered, duplicate-free terms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionSet {
    pub leagues: Vec<String>,
    pub teams: Vec<String>,
    pub players: Vec<String>,
    pub tournaments: Vec<String>,
}

impl SubscriptionSet {
    pub fn collection(&self, category: Category) -> &[String] {
        match category {
            Category::League => &self.leagues,
            Category::Team => &self.teams,
            Category::Player => &self.players,
            Category::Tournament => &self.tournaments,
        }
    }

    fn collection_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::League => &mut self.leagues,
            Category::Team => &mut self.teams,
            Category::Player => &mut self.players,
            Category::Tournament => &mut self.tournaments,
        }
    }

    pub fn contains(&self, term: &str, category: Category) -> bool {
        self.collection(category).iter().any(|t| t == term)
    }

    /// Append `term` unless already present. Returns whether the set changed.
    pub fn insert(&mut self, term: &str, category: Category) -> bool {
        if self.contains(term, category) {
            return false;
        }
        self.collection_mut(category).push(term.to_string());
        true
    }

    /// Drop every occurrence of `term`. Returns how many were removed.
    pub fn remove_all(&mut self, term: &str, category: Category) -> usize {
        let collection = self.collection_mut(category);
        let before = collection.len();
        collection.retain(|t| t != term);
        before - collection.len()
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.collection(*c).is_empty())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid category: {0:?}")]
    InvalidCategory(String),

    #[error("term must not be empty")]
    InvalidTerm,

    #[error("failed to persist subscriptions: {0}")]
    Persistence(String),
}

/// CRUD over the subscription set, backed by an injected storage port.
///
/// There is no locking: `add` and `remove` read the whole set, mutate it and
/// write it back, so concurrent callers can lose each other's updates.
#[derive(Clone)]
pub struct SubscriptionStore {
    storage: Arc<dyn SubscriptionStorage>,
}

impl SubscriptionStore {
    pub fn new(storage: Arc<dyn SubscriptionStorage>) -> Self {
        Self { storage }
    }

    /// Current set. Initializes an empty record when none exists and never
    /// fails: read errors are logged and answered with an empty set.
    pub async fn load(&self) -> SubscriptionSet {
        match self.storage.read().await {
            Ok(Some(set)) => set,
            Ok(None) => {
                let set = SubscriptionSet::default();
                match self.storage.write(&set).await {
                    Ok(()) => info!("initialized empty subscription store"),
                    Err(e) => warn!(error = %format!("{:#}", e), "failed to initialize subscription store"),
                }
                set
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "failed to read subscriptions, serving empty set");
                SubscriptionSet::default()
            }
        }
    }

    pub async fn add(&self, term: &str, category: &str) -> Result<SubscriptionSet, StoreError> {
        let category: Category = category.parse()?;
        if term.trim().is_empty() {
            return Err(StoreError::InvalidTerm);
        }

        let mut set = self.load().await;
        if !set.insert(term, category) {
            return Ok(set);
        }

        self.persist(&set).await?;
        info!(term, %category, "subscription added");
        Ok(set)
    }

    pub async fn remove(&self, term: &str, category: &str) -> Result<SubscriptionSet, StoreError> {
        let category: Category = category.parse()?;

        let mut set = self.load().await;
        let removed = set.remove_all(term, category);

        self.persist(&set).await?;
        info!(term, %category, removed, "subscription removed");
        Ok(set)
    }

    async fn persist(&self, set: &SubscriptionSet) -> Result<(), StoreError> {
        self.storage.write(set).await.map_err(|e| {
            let message = format!("{:#}", e);
            warn!(error = %message, "failed to persist subscriptions");
            StoreError::Persistence(message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store_with(storage: Arc<MemoryStorage>) -> SubscriptionStore {
        SubscriptionStore::new(storage)
    }

    #[test]
    fn category_parsing_is_case_insensitive() {
        assert_eq!("TEAM".parse::<Category>().unwrap(), Category::Team);
        assert_eq!(" League ".parse::<Category>().unwrap(), Category::League);
        assert_eq!("players".parse::<Category>().unwrap(), Category::Player);
        assert_eq!("Tournament".parse::<Category>().unwrap(), Category::Tournament);
        assert!(matches!(
            "galaxy".parse::<Category>(),
            Err(StoreError::InvalidCategory(c)) if c == "galaxy"
        ));
    }

    #[tokio::test]
    async fn fresh_store_initializes_empty_record() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());

        let set = store.load().await;
        assert!(set.is_empty());
        assert_eq!(storage.snapshot(), Some(SubscriptionSet::default()));
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());

        store.add("Arsenal", "team").await.unwrap();
        let once = storage.snapshot();
        store.add("Arsenal", "team").await.unwrap();

        assert_eq!(storage.snapshot(), once);
        assert_eq!(store.load().await.teams, vec!["Arsenal".to_string()]);
    }

    #[tokio::test]
    async fn add_keeps_insertion_order_and_case() {
        let store = store_with(Arc::new(MemoryStorage::new()));

        store.add("Saka", "player").await.unwrap();
        store.add("saka", "Player").await.unwrap();
        store.add("Odegaard", "PLAYER").await.unwrap();

        assert_eq!(store.load().await.players, vec!["Saka", "saka", "Odegaard"]);
    }

    #[tokio::test]
    async fn same_term_may_live_in_several_categories() {
        let store = store_with(Arc::new(MemoryStorage::new()));

        store.add("Champions League", "league").await.unwrap();
        store.add("Champions League", "tournament").await.unwrap();

        let set = store.load().await;
        assert_eq!(set.leagues, vec!["Champions League"]);
        assert_eq!(set.tournaments, vec!["Champions League"]);
    }

    #[tokio::test]
    async fn unknown_category_leaves_store_untouched() {
        let mut seeded = SubscriptionSet::default();
        seeded.leagues.push("Serie A".to_string());
        let storage = Arc::new(MemoryStorage::with_record(seeded.clone()));
        let store = store_with(storage.clone());

        let err = store.add("X", "galaxy").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCategory(_)));
        let err = store.remove("Serie A", "galaxy").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCategory(_)));

        assert_eq!(storage.snapshot(), Some(seeded));
    }

    #[tokio::test]
    async fn blank_term_is_rejected() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        assert!(matches!(store.add("   ", "team").await, Err(StoreError::InvalidTerm)));
    }

    #[tokio::test]
    async fn remove_filters_every_occurrence() {
        let seeded = SubscriptionSet {
            players: vec!["X".into(), "Y".into(), "X".into()],
            ..SubscriptionSet::default()
        };
        let storage = Arc::new(MemoryStorage::with_record(seeded));
        let store = store_with(storage.clone());

        let set = store.remove("X", "player").await.unwrap();
        assert_eq!(set.players, vec!["Y"]);
        assert_eq!(storage.snapshot().unwrap().players, vec!["Y"]);
    }

    #[tokio::test]
    async fn remove_missing_term_still_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());

        let set = store.remove("Nobody", "player").await.unwrap();
        assert!(set.is_empty());
        assert_eq!(storage.snapshot(), Some(SubscriptionSet::default()));
    }

    #[tokio::test]
    async fn write_failure_surfaces_as_persistence_error() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.load().await;
        storage.set_fail_writes(true);

        let err = store.add("Arsenal", "team").await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        let err = store.remove("Arsenal", "team").await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
    }

    #[tokio::test]
    async fn load_survives_failed_initialization() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_writes(true);
        let store = store_with(storage);

        assert!(store.load().await.is_empty());
    }
}

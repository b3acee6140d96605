use std::sync::Arc;

use indexmap::IndexMap;

use crate::state::content::{GameDefinition, RewardProvider, Rewards};

/// Playable games keyed by identifier, in authoring order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    games: IndexMap<String, Arc<GameDefinition>>,
}

impl Catalog {
    /// Wrap already validated games. Later duplicates replace earlier entries.
    pub fn new(games: impl IntoIterator<Item = GameDefinition>) -> Self {
        Self {
            games: games
                .into_iter()
                .map(|game| (game.id.clone(), Arc::new(game)))
                .collect(),
        }
    }

    /// Look a game up by identifier.
    pub fn get(&self, id: &str) -> Option<Arc<GameDefinition>> {
        self.games.get(id).cloned()
    }

    /// Games in authoring order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<GameDefinition>> {
        self.games.values()
    }

    /// Game at `position` in authoring order.
    pub fn get_index(&self, position: usize) -> Option<Arc<GameDefinition>> {
        self.games.get_index(position).map(|(_, game)| game.clone())
    }

    /// The game following `id`, used by hosts to route onwards after a finished game.
    pub fn next_after(&self, id: &str) -> Option<Arc<GameDefinition>> {
        let position = self.games.get_index_of(id)?;
        self.get_index(position + 1)
    }

    /// Number of games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether the catalog holds no game.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl RewardProvider for Catalog {
    fn rewards(&self, game_id: &str) -> Option<Rewards> {
        self.games.get(game_id).map(|game| game.rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::content::{GameMode, fixtures};

    fn catalog() -> Catalog {
        let first = fixtures::game(GameMode::Quiz);
        let mut second = fixtures::game(GameMode::Reflex { round_seconds: 10 });
        second.id = "green-sprint".into();
        second.rewards.coins_per_round = 12;
        Catalog::new([first, second])
    }

    #[test]
    fn preserves_authoring_order() {
        let ids: Vec<_> = catalog().iter().map(|game| game.id.clone()).collect();
        assert_eq!(ids, ["budget-basics", "green-sprint"]);
    }

    #[test]
    fn next_after_routes_forward() {
        let catalog = catalog();
        assert_eq!(
            catalog.next_after("budget-basics").map(|game| game.id.clone()),
            Some("green-sprint".to_string())
        );
        assert!(catalog.next_after("green-sprint").is_none());
        assert!(catalog.next_after("unknown").is_none());
    }

    #[test]
    fn provides_rewards_per_game() {
        let catalog = catalog();
        assert_eq!(
            catalog
                .rewards("green-sprint")
                .map(|rewards| rewards.coins_per_round),
            Some(12)
        );
        assert_eq!(catalog.rewards("missing"), None);
    }
}

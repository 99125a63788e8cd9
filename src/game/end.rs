//! End conditions and player elimination.

use serde::{Deserialize, Serialize};

use super::{Player, PlayerStatus};
use crate::map::Map;

/// How a finished game was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Winning player ids; empty for a draw or abandoned game.
    pub winners: Vec<String>,
    /// Human-readable reason.
    pub reason: String,
}

impl GameOutcome {
    /// Outcome with the given winners.
    #[must_use]
    pub fn new(winners: Vec<String>, reason: impl Into<String>) -> Self {
        Self {
            winners,
            reason: reason.into(),
        }
    }
}

/// A rule that may end a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    /// At most one contender still holds territory or units.
    LastStanding,
    /// At most one contender still owns a king.
    KingSurvival,
    /// The turn count reached the limit; most troops wins.
    TurnLimit(u32),
}

impl EndCondition {
    /// Check this condition against the current roster and map.
    #[must_use]
    pub fn evaluate(&self, players: &[Player], map: &Map, turn: u32) -> Option<GameOutcome> {
        match *self {
            Self::LastStanding => survivors(players, |p| map.holds_territory(p.index))
                .map(|winners| GameOutcome::new(winners, "last player standing")),
            Self::KingSurvival => survivors(players, |p| map.has_king(p.index))
                .map(|winners| GameOutcome::new(winners, "last king standing")),
            Self::TurnLimit(limit) if turn >= limit => {
                let contenders = players.iter().filter(|p| p.status.is_contending());
                let best = contenders.clone().map(|p| map.troops(p.index)).max()?;
                let winners = contenders
                    .filter(|p| map.troops(p.index) == best)
                    .map(|p| p.id.clone())
                    .collect();
                Some(GameOutcome::new(winners, "turn limit reached"))
            }
            Self::TurnLimit(_) => None,
        }
    }
}

/// Contenders passing `alive`, if at most one remains.
fn survivors(players: &[Player], alive: impl Fn(&Player) -> bool) -> Option<Vec<String>> {
    let remaining: Vec<String> = players
        .iter()
        .filter(|p| p.status.is_contending() && alive(p))
        .map(|p| p.id.clone())
        .collect();
    (remaining.len() <= 1).then_some(remaining)
}

/// Every contender is disconnected.
#[must_use]
pub fn all_left(players: &[Player]) -> Option<GameOutcome> {
    let mut contenders = players.iter().filter(|p| p.status.is_contending()).peekable();
    contenders.peek()?;
    contenders
        .all(|p| p.status == PlayerStatus::Disconnected)
        .then(|| GameOutcome::new(Vec::new(), "all players left"))
}

/// Ids of contenders who lost their territory, or their king when `kings`
/// is set.
#[must_use]
pub fn eliminated(players: &[Player], map: &Map, kings: bool) -> Vec<String> {
    players
        .iter()
        .filter(|p| p.status.is_contending())
        .filter(|p| !map.holds_territory(p.index) || (kings && !map.has_king(p.index)))
        .map(|p| p.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::map::MapInfo;

    fn playing(id: &str, index: u8) -> Player {
        let mut player = Player::new(id, id, index);
        player.status = PlayerStatus::InGame;
        player
    }

    fn strip(blocks: Vec<Block>) -> Map {
        Map::from_rows(MapInfo::default(), vec![blocks]).unwrap()
    }

    #[test]
    fn test_last_standing() {
        let players = [playing("a", 1), playing("b", 2)];
        let both = strip(vec![Block::king(1, 1), Block::soldier(2, 2)]);
        assert_eq!(EndCondition::LastStanding.evaluate(&players, &both, 3), None);

        let one = strip(vec![Block::king(1, 1), Block::castle(2, 1)]);
        let outcome = EndCondition::LastStanding.evaluate(&players, &one, 3).unwrap();
        assert_eq!(outcome.winners, vec!["a".to_string()]);
    }

    #[test]
    fn test_king_survival_ignores_other_territory() {
        let players = [playing("a", 1), playing("b", 2)];
        let map = strip(vec![Block::king(1, 1), Block::soldier(9, 2), Block::castle(3, 2)]);
        let outcome = EndCondition::KingSurvival.evaluate(&players, &map, 0).unwrap();
        assert_eq!(outcome.winners, vec!["a".to_string()]);
        assert!(EndCondition::LastStanding.evaluate(&players, &map, 0).is_none());
    }

    #[test]
    fn test_turn_limit_picks_most_troops() {
        let players = [playing("a", 1), playing("b", 2), playing("c", 3)];
        let map = strip(vec![Block::soldier(5, 1), Block::soldier(7, 2), Block::soldier(7, 3)]);
        assert!(EndCondition::TurnLimit(10).evaluate(&players, &map, 9).is_none());
        let outcome = EndCondition::TurnLimit(10).evaluate(&players, &map, 10).unwrap();
        assert_eq!(outcome.winners, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_terminal_players_do_not_count() {
        let mut players = [playing("a", 1), playing("b", 2)];
        players[1].status = PlayerStatus::Surrendered;
        let map = strip(vec![Block::king(1, 1), Block::king(1, 2)]);
        let outcome = EndCondition::LastStanding.evaluate(&players, &map, 0).unwrap();
        assert_eq!(outcome.winners, vec!["a".to_string()]);
    }

    #[test]
    fn test_all_left() {
        let mut players = [playing("a", 1), playing("b", 2)];
        players[0].status = PlayerStatus::Disconnected;
        assert!(all_left(&players).is_none());
        players[1].status = PlayerStatus::Disconnected;
        assert_eq!(all_left(&players).unwrap().reason, "all players left");
        assert!(all_left(&[]).is_none());
    }

    #[test]
    fn test_eliminated() {
        let players = [playing("a", 1), playing("b", 2), playing("c", 3)];
        let map = strip(vec![Block::king(1, 1), Block::castle(4, 2)]);
        assert_eq!(eliminated(&players, &map, false), vec!["c".to_string()]);
        assert_eq!(
            eliminated(&players, &map, true),
            vec!["b".to_string(), "c".to_string()]
        );
    }
}

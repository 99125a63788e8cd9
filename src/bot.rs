//! Scripted local players.
//!
//! A [`Bot`] reads the broadcasts addressed to it and answers with move
//! commands, the way a remote client would. Decisions only use the fogged
//! view the bot receives.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::block::{Block, Owner};
use crate::game::{BroadcastEvent, Command, CommandEvent};
use crate::map::{Direction, Map, Position};

/// How a bot picks its moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Any legal move from any owned stack.
    Random,
    /// Captures first, then expansion into blank cells.
    #[default]
    Greedy,
}

/// A seeded bot bound to one player id.
#[derive(Debug, Clone)]
pub struct Bot {
    player_id: String,
    owner: Option<Owner>,
    strategy: Strategy,
    moves_per_turn: u32,
    turn: Option<u32>,
    moved: u32,
    rng: ChaCha8Rng,
}

impl Bot {
    /// Bot playing as `player_id`.
    #[must_use]
    pub fn new(player_id: impl Into<String>, strategy: Strategy, seed: u64) -> Self {
        Self {
            player_id: player_id.into(),
            owner: None,
            strategy,
            moves_per_turn: 1,
            turn: None,
            moved: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Issue up to `moves` commands per turn.
    #[must_use]
    pub fn with_moves_per_turn(mut self, moves: u32) -> Self {
        self.moves_per_turn = moves.max(1);
        self
    }

    /// Player id.
    #[must_use]
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Owner id learned from the roster, once the game started.
    #[must_use]
    pub const fn owner(&self) -> Option<Owner> {
        self.owner
    }

    /// The command to join the game.
    #[must_use]
    pub fn join(&self) -> CommandEvent {
        CommandEvent::new(&*self.player_id, Command::join(format!("bot-{}", self.player_id)))
    }

    /// React to a broadcast, possibly with a command.
    pub fn observe(&mut self, event: &BroadcastEvent) -> Option<CommandEvent> {
        match event {
            BroadcastEvent::GameStatusUpdate { players, .. } => {
                if let Some(me) = players.iter().find(|p| p.id == self.player_id) {
                    self.owner = Some(me.index);
                }
                None
            }
            BroadcastEvent::MapUpdate {
                viewer,
                map,
                turn_number,
            } if *viewer == self.player_id => {
                if self.turn != Some(*turn_number) {
                    self.turn = Some(*turn_number);
                    self.moved = 0;
                }
                if self.moved >= self.moves_per_turn {
                    return None;
                }
                let command = self.decide(map)?;
                self.moved += 1;
                Some(CommandEvent::new(&*self.player_id, command))
            }
            _ => None,
        }
    }

    /// Pick a move on `map`.
    pub fn decide(&mut self, map: &Map) -> Option<Command> {
        let owner = self.owner?;
        let mut candidates: Vec<(u8, Position, Direction)> = Vec::new();
        for (pos, block) in map.owned_cells(owner) {
            let available = block.num().saturating_sub(block.garrison());
            if available == 0 || !block.allow_move().from {
                continue;
            }
            for direction in Direction::ALL {
                let Some(target) = pos.step(direction).and_then(|t| map.block(t).ok()) else {
                    continue;
                };
                if !target.allow_move().to {
                    continue;
                }
                let score = match self.strategy {
                    Strategy::Random => 0,
                    Strategy::Greedy => target_score(target, owner, available),
                };
                candidates.push((score, pos, direction));
            }
        }

        let best = candidates.iter().map(|c| c.0).max()?;
        candidates.retain(|c| c.0 == best);
        let &(_, from, direction) = candidates.choose(&mut self.rng)?;
        Some(Command::Move {
            from,
            direction,
            troops: 0,
        })
    }
}

fn target_score(target: &Block, owner: Owner, available: u32) -> u8 {
    match target {
        Block::King { owner: o, num, .. } if *o != owner && *num < available => 5,
        Block::Castle { owner: o, num } if *o != owner && *num < available => 4,
        Block::Soldier { owner: o, num } if *o != owner && *num < available => 3,
        Block::Blank => 2,
        b if b.owner() == owner => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PlayerStatus, PlayerView};
    use crate::map::MapInfo;

    fn seated(strategy: Strategy) -> Bot {
        let mut bot = Bot::new("b1", strategy, 3);
        bot.observe(&BroadcastEvent::GameStatusUpdate {
            status: crate::game::GameStatus::InProgress,
            players: vec![PlayerView {
                id: "b1".into(),
                name: "bot".into(),
                index: 1,
                status: PlayerStatus::InGame,
                finish_reason: None,
            }],
            turn_number: 0,
        });
        bot
    }

    fn update(map: Map, turn_number: u32) -> BroadcastEvent {
        BroadcastEvent::MapUpdate {
            viewer: "b1".into(),
            map,
            turn_number,
        }
    }

    #[test]
    fn test_learns_owner_from_roster() {
        assert_eq!(Bot::new("b1", Strategy::Random, 0).owner(), None);
        assert_eq!(seated(Strategy::Random).owner(), Some(1));
    }

    #[test]
    fn test_greedy_prefers_capture() {
        let map = Map::from_rows(
            MapInfo::default(),
            vec![vec![Block::Blank, Block::soldier(8, 1), Block::castle(3, 2)]],
        )
        .unwrap();
        let mut bot = seated(Strategy::Greedy);
        assert_eq!(
            bot.decide(&map),
            Some(Command::Move {
                from: Position::new(2, 1),
                direction: Direction::Right,
                troops: 0
            })
        );
    }

    #[test]
    fn test_no_move_without_troops() {
        let map = Map::from_rows(
            MapInfo::default(),
            vec![vec![Block::soldier(1, 1), Block::Blank]],
        )
        .unwrap();
        assert_eq!(seated(Strategy::Random).decide(&map), None);
    }

    #[test]
    fn test_one_move_per_turn() {
        let map = Map::from_rows(
            MapInfo::default(),
            vec![vec![Block::soldier(5, 1), Block::Blank]],
        )
        .unwrap();
        let mut bot = seated(Strategy::Greedy);
        assert!(bot.observe(&update(map.clone(), 0)).is_some());
        assert!(bot.observe(&update(map.clone(), 0)).is_none());
        assert!(bot.observe(&update(map, 1)).is_some());
    }

    #[test]
    fn test_ignores_other_viewers() {
        let map = Map::from_rows(MapInfo::default(), vec![vec![Block::soldier(5, 1), Block::Blank]])
            .unwrap();
        let mut bot = seated(Strategy::Greedy);
        let event = BroadcastEvent::MapUpdate {
            viewer: "someone".into(),
            map,
            turn_number: 0,
        };
        assert!(bot.observe(&event).is_none());
    }

    #[test]
    fn test_seeded_bots_agree() {
        let map = Map::from_rows(
            MapInfo::default(),
            vec![
                vec![Block::Blank, Block::Blank, Block::Blank],
                vec![Block::Blank, Block::soldier(9, 1), Block::Blank],
                vec![Block::Blank, Block::Blank, Block::Blank],
            ],
        )
        .unwrap();
        let mut a = seated(Strategy::Random);
        let mut b = seated(Strategy::Random);
        for _ in 0..10 {
            assert_eq!(a.decide(&map), b.decide(&map));
        }
    }
}

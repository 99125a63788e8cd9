//! Block model: the unit and terrain occupying each map cell.
//!
//! The variant set is closed. Every rule (growth, combat, fog) is an
//! exhaustive `match` over [`Block`], so adding a variant is a compile error
//! everywhere a rule needs updating.

mod combat;
mod registry;

pub use combat::{resolve_attack, AttackResult, SOLDIER_GROWTH_PERIOD};
pub use registry::BlockRegistry;

use serde::{Deserialize, Serialize};

/// Player identifier attached to a block. `0` is neutral.
pub type Owner = u8;

/// Troop count on a block.
pub type Num = u32;

/// The neutral owner.
pub const NEUTRAL: Owner = 0;

/// Field-less tag for a block variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Empty, claimable ground.
    Blank,
    /// A stack of troops away from any building.
    Soldier,
    /// A troop-producing building.
    Castle,
    /// A player's home building. Losing it turns it into a castle.
    King,
    /// Impassable terrain.
    Mountain,
}

impl BlockKind {
    /// Every kind, in registry order.
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Blank,
        BlockKind::Soldier,
        BlockKind::Castle,
        BlockKind::King,
        BlockKind::Mountain,
    ];

    /// Stable lowercase name used by the export format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            BlockKind::Blank => "blank",
            BlockKind::Soldier => "soldier",
            BlockKind::Castle => "castle",
            BlockKind::King => "king",
            BlockKind::Mountain => "mountain",
        }
    }

    /// Display metadata for this kind.
    #[must_use]
    pub const fn meta(self) -> BlockMeta {
        match self {
            BlockKind::Blank => BlockMeta {
                name: "blank",
                description: "Empty ground. Moving onto it claims it.",
                visibility_fallback: BlockKind::Blank,
            },
            BlockKind::Soldier => BlockMeta {
                name: "soldier",
                description: "Troops in the field. Reinforced every 25 turns.",
                visibility_fallback: BlockKind::Blank,
            },
            BlockKind::Castle => BlockMeta {
                name: "castle",
                description: "Produces one troop per turn while owned.",
                visibility_fallback: BlockKind::Blank,
            },
            BlockKind::King => BlockMeta {
                name: "king",
                description: "A player's capital. Lose it and it becomes a castle.",
                visibility_fallback: BlockKind::Blank,
            },
            BlockKind::Mountain => BlockMeta {
                name: "mountain",
                description: "Impassable terrain.",
                visibility_fallback: BlockKind::Mountain,
            },
        }
    }
}

/// Static description of a block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMeta {
    /// Stable name, matches [`BlockKind::name`].
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// What an observer without ownership or sight sees instead.
    pub visibility_fallback: BlockKind,
}

/// Whether a cell may originate or receive a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePermission {
    /// The cell may be the source of a move.
    pub from: bool,
    /// The cell may be the target of a move.
    pub to: bool,
}

/// The content of a single map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Block {
    /// Empty, unowned ground.
    #[default]
    Blank,
    /// Troops outside a building.
    Soldier {
        /// Troop count.
        num: Num,
        /// Owning player.
        owner: Owner,
    },
    /// A building that grows while owned.
    Castle {
        /// Troop count.
        num: Num,
        /// Owning player, `NEUTRAL` for unclaimed castles.
        owner: Owner,
    },
    /// A player's capital.
    King {
        /// Troop count.
        num: Num,
        /// Current owner. Differs from `original_owner` only transiently.
        owner: Owner,
        /// The player this king belongs to.
        original_owner: Owner,
    },
    /// Impassable terrain.
    Mountain,
}

impl Block {
    /// Soldier stack.
    #[must_use]
    pub const fn soldier(num: Num, owner: Owner) -> Self {
        Block::Soldier { num, owner }
    }

    /// Castle, possibly neutral.
    #[must_use]
    pub const fn castle(num: Num, owner: Owner) -> Self {
        Block::Castle { num, owner }
    }

    /// King owned by its original owner.
    #[must_use]
    pub const fn king(num: Num, owner: Owner) -> Self {
        Block::King {
            num,
            owner,
            original_owner: owner,
        }
    }

    /// Variant tag.
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        match self {
            Block::Blank => BlockKind::Blank,
            Block::Soldier { .. } => BlockKind::Soldier,
            Block::Castle { .. } => BlockKind::Castle,
            Block::King { .. } => BlockKind::King,
            Block::Mountain => BlockKind::Mountain,
        }
    }

    /// Current troop count.
    #[must_use]
    pub const fn num(&self) -> Num {
        match self {
            Block::Soldier { num, .. } | Block::Castle { num, .. } | Block::King { num, .. } => {
                *num
            }
            Block::Blank | Block::Mountain => 0,
        }
    }

    /// Current owner.
    #[must_use]
    pub const fn owner(&self) -> Owner {
        match self {
            Block::Soldier { owner, .. }
            | Block::Castle { owner, .. }
            | Block::King { owner, .. } => *owner,
            Block::Blank | Block::Mountain => NEUTRAL,
        }
    }

    /// Display metadata.
    #[must_use]
    pub const fn meta(&self) -> BlockMeta {
        self.kind().meta()
    }

    /// Whether this is a castle or king.
    #[must_use]
    pub const fn is_building(&self) -> bool {
        matches!(self, Block::Castle { .. } | Block::King { .. })
    }

    /// Troops that must stay behind when the whole stack moves.
    #[must_use]
    pub const fn garrison(&self) -> Num {
        match self {
            Block::Soldier { .. } | Block::Castle { .. } | Block::King { .. } => 1,
            Block::Blank | Block::Mountain => 0,
        }
    }

    /// Growth hook run at the start of every turn.
    pub fn round_start(&mut self, turn: u32) {
        match self {
            Block::Castle { num, owner } | Block::King { num, owner, .. } => {
                if *owner != NEUTRAL {
                    *num = num.saturating_add(1);
                }
            }
            Block::Soldier { num, .. } => {
                if turn % SOLDIER_GROWTH_PERIOD == 1 && turn != 1 {
                    *num = num.saturating_add(1);
                }
            }
            Block::Blank | Block::Mountain => {}
        }
    }

    /// Hook run at the end of every turn. No variant decays today.
    pub fn round_end(&mut self, _turn: u32) {
        match self {
            Block::Blank
            | Block::Soldier { .. }
            | Block::Castle { .. }
            | Block::King { .. }
            | Block::Mountain => {}
        }
    }

    /// Which move directions this cell takes part in.
    #[must_use]
    pub const fn allow_move(&self) -> MovePermission {
        match self {
            Block::Blank => MovePermission {
                from: false,
                to: true,
            },
            Block::Soldier { .. } | Block::Castle { .. } | Block::King { .. } => MovePermission {
                from: true,
                to: true,
            },
            Block::Mountain => MovePermission {
                from: false,
                to: false,
            },
        }
    }

    /// Remove up to `amount` troops and return how many left the cell.
    ///
    /// Units and buildings always keep at least one troop behind.
    pub fn move_from(&mut self, amount: Num) -> Num {
        match self {
            Block::Soldier { num, .. } | Block::Castle { num, .. } | Block::King { num, .. } => {
                let moved = amount.min(num.saturating_sub(1));
                *num -= moved;
                moved
            }
            Block::Blank | Block::Mountain => 0,
        }
    }

    /// Resolve `amount` incoming troops from `owner` against this cell.
    ///
    /// Returns the block that replaces this one when the variant changes,
    /// `None` when the cell was updated in place.
    #[must_use]
    pub fn move_to(&mut self, amount: Num, owner: Owner) -> Option<Block> {
        match self {
            Block::Blank => Some(Block::soldier(amount, owner)),
            Block::Soldier { num, owner: current } | Block::Castle { num, owner: current } => {
                resolve_attack(num, current, amount, owner);
                None
            }
            Block::King {
                num,
                owner: current,
                original_owner,
            } => {
                resolve_attack(num, current, amount, owner);
                if *current == *original_owner {
                    None
                } else {
                    Some(Block::castle(*num, *current))
                }
            }
            Block::Mountain => None,
        }
    }

    /// What an observer sees at this cell.
    ///
    /// Owners and observers with sight see the real block, everyone else
    /// sees the kind's visibility fallback with no troops or owner.
    #[must_use]
    pub fn fog(&self, is_owner: bool, is_sight: bool) -> Block {
        if is_owner || is_sight {
            return *self;
        }
        BlockRegistry::create(self.meta().visibility_fallback, 0, NEUTRAL)
    }
}

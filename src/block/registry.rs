//! Name-to-kind lookup for block construction.

use std::collections::BTreeMap;

use super::{Block, BlockKind, BlockMeta, Num, Owner, NEUTRAL};
use crate::error::MapError;

/// Registry of constructible block kinds, keyed by name.
///
/// Built once at startup and handed to the map importer and generators.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    kinds: BTreeMap<&'static str, BlockKind>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl BlockRegistry {
    /// Registry without any kinds.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in BlockKind::ALL {
            registry.register(kind);
        }
        registry
    }

    /// Make `kind` constructible by name.
    pub fn register(&mut self, kind: BlockKind) {
        self.kinds.insert(kind.name(), kind);
    }

    /// Look up a kind by its name.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<BlockKind> {
        self.kinds.get(name).copied()
    }

    /// Metadata for every registered kind, in name order.
    pub fn metas(&self) -> impl Iterator<Item = BlockMeta> + '_ {
        self.kinds.values().map(|kind| kind.meta())
    }

    /// Construct a block of `kind`.
    ///
    /// Terrain kinds ignore `num` and `owner`. Kings start owned by their
    /// original owner.
    #[must_use]
    pub const fn create(kind: BlockKind, num: Num, owner: Owner) -> Block {
        match kind {
            BlockKind::Blank => Block::Blank,
            BlockKind::Soldier => Block::soldier(num, owner),
            BlockKind::Castle => Block::castle(num, owner),
            BlockKind::King => Block::king(num, owner),
            BlockKind::Mountain => Block::Mountain,
        }
    }

    /// Construct a block by name.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnknownBlock`] if the name is not registered, or
    /// [`MapError::Malformed`] for an unowned king.
    pub fn build(&self, name: &str, num: Num, owner: Owner) -> Result<Block, MapError> {
        let kind = self
            .kind(name)
            .ok_or_else(|| MapError::UnknownBlock(name.to_string()))?;
        if kind == BlockKind::King && owner == NEUTRAL {
            return Err(MapError::Malformed("king without an owner".to_string()));
        }
        Ok(Self::create(kind, num, owner))
    }
}

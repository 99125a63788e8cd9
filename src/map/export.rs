//! JSON export format shared with clients and debugging tools.
//!
//! ```json
//! {
//!   "size": {"width": 2, "height": 1},
//!   "info": {"id": "m", "name": "M", "desc": ""},
//!   "blocks": [[{"num": 1, "owner": 1, "meta": {"name": "king", "description": "..."}},
//!               {"num": 0, "owner": 0, "meta": {"name": "blank", "description": "..."}}]]
//! }
//! ```
//!
//! `blocks` is dense: the outer array holds rows (y), the inner array
//! columns (x).

use serde::{Deserialize, Serialize, Serializer};

use super::{Map, MapInfo, Size};
use crate::block::{Block, BlockRegistry, Num, Owner};
use crate::error::{MapError, MapResult};

/// Serialized form of a whole map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapExport {
    /// Grid dimensions.
    pub size: Size,
    /// Identity metadata.
    pub info: MapInfo,
    /// Rows of cells.
    pub blocks: Vec<Vec<BlockExport>>,
}

/// Serialized form of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExport {
    /// Troop count.
    pub num: Num,
    /// Owner id.
    pub owner: Owner,
    /// Kind metadata.
    pub meta: MetaExport,
}

/// Serialized block metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaExport {
    /// Kind name, resolved through the block registry on import.
    pub name: String,
    /// Human-readable description. Ignored on import.
    #[serde(default)]
    pub description: String,
}

impl From<&Block> for BlockExport {
    fn from(block: &Block) -> Self {
        let meta = block.meta();
        Self {
            num: block.num(),
            owner: block.owner(),
            meta: MetaExport {
                name: meta.name.to_string(),
                description: meta.description.to_string(),
            },
        }
    }
}

impl Map {
    /// Export this map.
    #[must_use]
    pub fn to_export(&self) -> MapExport {
        let width = usize::from(self.width()).max(1);
        MapExport {
            size: self.size(),
            info: self.info().clone(),
            blocks: self
                .blocks()
                .chunks(width)
                .map(|row| row.iter().map(BlockExport::from).collect())
                .collect(),
        }
    }

    /// Export this map as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only happens on allocation failure.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_export())
    }

    /// Rebuild a map from its export, resolving block names via `registry`.
    ///
    /// # Errors
    ///
    /// - [`MapError::UnknownBlock`] for a name the registry does not know
    /// - [`MapError::Malformed`] if `blocks` disagrees with `size`
    pub fn from_export(export: MapExport, registry: &BlockRegistry) -> MapResult<Self> {
        let MapExport { size, info, blocks } = export;
        if blocks.len() != usize::from(size.height) {
            return Err(MapError::Malformed(format!(
                "size says {} rows, found {}",
                size.height,
                blocks.len()
            )));
        }
        let rows = blocks
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| registry.build(&cell.meta.name, cell.num, cell.owner))
                    .collect::<MapResult<Vec<_>>>()
            })
            .collect::<MapResult<Vec<_>>>()?;
        let map = Self::from_rows(info, rows)?;
        if map.size() != size {
            return Err(MapError::Malformed(format!(
                "size says {}x{}, blocks are {}x{}",
                size.width,
                size.height,
                map.width(),
                map.height()
            )));
        }
        Ok(map)
    }

    /// Parse a map from export JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Malformed`] for invalid JSON, plus every error of
    /// [`Map::from_export`].
    pub fn from_json(json: &str, registry: &BlockRegistry) -> MapResult<Self> {
        let export: MapExport =
            serde_json::from_str(json).map_err(|e| MapError::Malformed(e.to_string()))?;
        Self::from_export(export, registry)
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_export().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Position;

    fn sample() -> Map {
        let rows = vec![
            vec![Block::king(2, 1), Block::soldier(5, 1), Block::Mountain],
            vec![Block::Blank, Block::castle(14, 0), Block::king(1, 2)],
        ];
        Map::from_rows(MapInfo::new("sample", "Sample", "two kings"), rows).unwrap()
    }

    #[test]
    fn test_export_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["size"]["width"], 3);
        assert_eq!(value["size"]["height"], 2);
        assert_eq!(value["info"]["id"], "sample");
        assert_eq!(value["blocks"].as_array().unwrap().len(), 2);
        assert_eq!(value["blocks"][0][1]["num"], 5);
        assert_eq!(value["blocks"][0][1]["owner"], 1);
        assert_eq!(value["blocks"][0][2]["meta"]["name"], "mountain");
        assert_eq!(value["blocks"][1][1]["meta"]["name"], "castle");
    }

    #[test]
    fn test_import_restores_blocks() {
        let map = sample();
        let json = map.to_json().unwrap();
        let restored = Map::from_json(&json, &BlockRegistry::with_defaults()).unwrap();
        assert_eq!(restored, map);
        assert_eq!(restored.king_position(2), Some(Position::new(3, 2)));
    }

    #[test]
    fn test_import_rejects_unknown_names() {
        let json = r#"{"size":{"width":1,"height":1},"info":{"id":"","name":"","desc":""},
            "blocks":[[{"num":0,"owner":0,"meta":{"name":"lava"}}]]}"#;
        assert_eq!(
            Map::from_json(json, &BlockRegistry::with_defaults()),
            Err(MapError::UnknownBlock("lava".to_string()))
        );
    }

    #[test]
    fn test_import_rejects_size_mismatch() {
        let mut export = sample().to_export();
        export.size.width = 4;
        assert!(matches!(
            Map::from_export(export, &BlockRegistry::with_defaults()),
            Err(MapError::Malformed(_))
        ));
    }
}

//! Structural shaping of analysis blocks into key/value pairs and tables.

use std::collections::{BTreeMap, HashMap};

use crate::models::extraction::{Block, BlockType, Table, TableCell};

/// Index of blocks by id for relationship lookups.
pub struct BlockIndex<'a> {
    by_id: HashMap<&'a str, &'a Block>,
}

impl<'a> BlockIndex<'a> {
    pub fn new(blocks: &'a [Block]) -> Self {
        Self {
            by_id: blocks.iter().map(|b| (b.id.as_str(), b)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a Block> {
        self.by_id.get(id).copied()
    }

    /// Text of the `WORD` children of `block`, joined by single spaces.
    pub fn child_text(&self, block: &Block) -> String {
        let words: Vec<&str> = block
            .relationships
            .iter()
            .filter(|rel| rel.kind == "CHILD")
            .flat_map(|rel| rel.ids.iter())
            .filter_map(|id| self.get(id))
            .filter(|child| child.block_type == BlockType::Word)
            .filter_map(|child| child.text.as_deref())
            .collect();
        words.join(" ")
    }
}

fn has_entity(block: &Block, entity: &str) -> bool {
    block.entity_types.iter().any(|e| e == entity)
}

/// Pair every KEY block with the VALUE block it points at.
///
/// Keys without a VALUE relationship are dropped; a repeated key keeps the
/// last value seen.
pub fn key_value_pairs(blocks: &[Block]) -> BTreeMap<String, String> {
    let index = BlockIndex::new(blocks);
    let mut pairs = BTreeMap::new();

    for key_block in blocks
        .iter()
        .filter(|b| b.block_type == BlockType::KeyValueSet && has_entity(b, "KEY"))
    {
        let value_id = key_block
            .relationships
            .iter()
            .find(|rel| rel.kind == "VALUE")
            .and_then(|rel| rel.ids.first());

        let Some(value_id) = value_id else {
            continue;
        };

        let value_text = index
            .get(value_id)
            .filter(|b| b.block_type == BlockType::KeyValueSet && has_entity(b, "VALUE"))
            .map(|value_block| index.child_text(value_block))
            .unwrap_or_default();

        pairs.insert(index.child_text(key_block), value_text);
    }

    pairs
}

/// Group CELL blocks into tables. Each TABLE block opens a new table and the
/// cells that follow it, in block order, belong to it.
pub fn tables(blocks: &[Block]) -> Vec<Table> {
    let index = BlockIndex::new(blocks);
    let mut tables = Vec::new();
    let mut current: Option<Table> = None;

    for block in blocks {
        match block.block_type {
            BlockType::Table => {
                if let Some(done) = current.replace(Table::default()) {
                    tables.push(done);
                }
            }
            BlockType::Cell => {
                let Some(table) = current.as_mut() else {
                    continue;
                };
                let (Some(row_index), Some(column_index)) = (block.row_index, block.column_index)
                else {
                    tracing::warn!(block_id = %block.id, "Cell without row/column index skipped");
                    continue;
                };
                table.rows.push(TableCell {
                    row_index,
                    column_index,
                    text: index.child_text(block),
                });
            }
            _ => {}
        }
    }

    tables.extend(current);
    tables
}

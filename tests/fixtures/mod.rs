//! Sample applicants and analysis output shared by the integration tests
#![allow(dead_code)]

use document_intake::models::applicant::{ApplicantContext, ApplicantRecord};
use document_intake::models::extraction::{Block, BlockType, Relationship};

pub fn applicant(applicant_id: i64, record_id: &str, first: &str, last: &str) -> ApplicantRecord {
    ApplicantRecord {
        applicant_id,
        record_id: record_id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
    }
}

pub fn jane() -> ApplicantRecord {
    applicant(1001, "recJane", "Jane", "Citizen")
}

pub fn john() -> ApplicantRecord {
    applicant(1002, "recJohn", "John", "Citizen")
}

pub fn single_applicant() -> ApplicantContext {
    ApplicantContext::single(jane())
}

pub fn joint_applicants() -> ApplicantContext {
    let mut ctx = ApplicantContext::new();
    ctx.insert("Applicant1", jane());
    ctx.insert("Applicant2", john());
    ctx
}

fn block(id: &str, block_type: BlockType) -> Block {
    Block {
        id: id.to_string(),
        block_type,
        text: None,
        entity_types: vec![],
        relationships: vec![],
        row_index: None,
        column_index: None,
    }
}

fn child(ids: Vec<String>) -> Relationship {
    Relationship {
        kind: "CHILD".to_string(),
        ids,
    }
}

/// Blocks of a one-table statement. Each row is
/// (date, description, debit, credit, balance); an empty string leaves the
/// cell without words.
pub fn statement_blocks(rows: &[[&str; 5]]) -> Vec<Block> {
    let mut blocks = vec![block("table-1", BlockType::Table)];
    let mut words = Vec::new();

    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            let cell_id = format!("cell-{r}-{c}");
            let mut cell = block(&cell_id, BlockType::Cell);
            cell.row_index = Some(r as u32 + 1);
            cell.column_index = Some(c as u32 + 1);

            if !text.is_empty() {
                let word_id = format!("word-{r}-{c}");
                let mut word = block(&word_id, BlockType::Word);
                word.text = Some(text.to_string());
                words.push(word);
                cell.relationships.push(child(vec![word_id]));
            }
            blocks.push(cell);
        }
    }

    blocks.extend(words);
    blocks
}

/// A statement with a header row and one grocery debit.
pub fn grocery_statement() -> Vec<Block> {
    statement_blocks(&[
        ["Date", "Description", "Debit", "Credit", "Balance"],
        ["01/03/2024", "Groceries", "$125.50", "", "$1,874.50"],
    ])
}

/// Key/value blocks for a form with the given pairs.
pub fn form_blocks(pairs: &[(&str, &str)]) -> Vec<Block> {
    let mut blocks = Vec::new();

    for (i, (key, value)) in pairs.iter().enumerate() {
        let key_word = format!("kw-{i}");
        let value_word = format!("vw-{i}");
        let key_id = format!("key-{i}");
        let value_id = format!("value-{i}");

        let mut key_block = block(&key_id, BlockType::KeyValueSet);
        key_block.entity_types = vec!["KEY".to_string()];
        key_block.relationships = vec![
            Relationship {
                kind: "VALUE".to_string(),
                ids: vec![value_id.clone()],
            },
            child(vec![key_word.clone()]),
        ];

        let mut value_block = block(&value_id, BlockType::KeyValueSet);
        value_block.entity_types = vec!["VALUE".to_string()];
        value_block.relationships = vec![child(vec![value_word.clone()])];

        let mut kw = block(&key_word, BlockType::Word);
        kw.text = Some(key.to_string());
        let mut vw = block(&value_word, BlockType::Word);
        vw.text = Some(value.to_string());

        blocks.extend([key_block, value_block, kw, vw]);
    }

    blocks
}

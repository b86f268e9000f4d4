use std::collections::BTreeMap;

use crate::models::extraction::Table;
use crate::models::statement::NewExtractedRow;

/// Characters removed from amount cells: currency symbols, whitespace and
/// the letters of the `DR` debit marker.
fn is_amount_noise(c: char) -> bool {
    matches!(c, '$' | '£' | '€' | 'D' | 'R') || c.is_whitespace()
}

/// Strip currency noise from an amount, keeping digits, commas and points.
/// Returns `None` when nothing is left.
pub fn clean_amount(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| !is_amount_noise(*c)).collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Turn statement tables into rows.
///
/// Cells are grouped by row index; columns are positional: text,
/// description, debit, credit, balance. Empty cells become `None`.
pub fn rows_from_tables(tables: &[Table]) -> Vec<NewExtractedRow> {
    let mut rows = Vec::new();

    for table in tables {
        if table.rows.is_empty() {
            tracing::warn!("Statement table has no cells");
            continue;
        }

        let mut grouped: BTreeMap<u32, BTreeMap<u32, &str>> = BTreeMap::new();
        for cell in &table.rows {
            grouped
                .entry(cell.row_index)
                .or_default()
                .insert(cell.column_index, cell.text.as_str());
        }

        for columns in grouped.values() {
            let column = |idx: u32| {
                columns
                    .get(&idx)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
            };

            rows.push(NewExtractedRow {
                text: column(1).map(str::to_string),
                description: column(2).map(str::to_string),
                debit: column(3).and_then(clean_amount),
                credit: column(4).and_then(clean_amount),
                balance: column(5).and_then(clean_amount),
            });
        }
    }

    rows
}

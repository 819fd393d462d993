use serde::Serialize;

use crate::page::element::{NestedItem, RawElement};
use crate::page::normalize::normalize_text;

/// Body row of a table. The empty-state and measure rows do not count.
pub fn is_data_row(item: &NestedItem) -> bool {
    if item.has_class("ant-table-placeholder") || item.has_class("ant-table-measure-row") {
        return false;
    }
    item.has_class("ant-table-row") || item.role.as_deref() == Some("row")
}

/// Column header texts in display order.
pub fn table_headers(el: &RawElement) -> Vec<String> {
    el.items
        .iter()
        .filter(|i| i.role.as_deref() == Some("columnheader") || i.has_class("ant-table-column-title"))
        .filter_map(NestedItem::display_text)
        .map(normalize_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Headers and body rows of a table as currently rendered. Rows are
/// 0-based; cell texts are normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn from_raw(el: &RawElement) -> Self {
        let rows = el
            .items
            .iter()
            .filter(|i| is_data_row(i))
            .map(|row| row.cells.iter().map(|c| normalize_text(c)).collect())
            .collect();
        TableView {
            headers: table_headers(el),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column headed `name`, exact before case-insensitive.
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = normalize_text(name);
        self.headers
            .iter()
            .position(|h| *h == wanted)
            .or_else(|| self.headers.iter().position(|h| h.eq_ignore_ascii_case(&wanted)))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column(column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// First row whose cell under `column` equals `value`.
    pub fn find_row(&self, column: &str, value: &str) -> Option<usize> {
        let col = self.column(column)?;
        let wanted = normalize_text(value);
        self.rows
            .iter()
            .position(|row| row.get(col).is_some_and(|c| *c == wanted))
    }

    /// A row as `(header, cell)` pairs. Cells without a header are dropped.
    pub fn record(&self, row: usize) -> Option<Vec<(&str, &str)>> {
        let cells = self.rows.get(row)?;
        Some(
            self.headers
                .iter()
                .zip(cells)
                .map(|(h, c)| (h.as_str(), c.as_str()))
                .collect(),
        )
    }
}

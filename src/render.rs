//! Result Renderer - shapes query output for display
//!
//! Rendering only stringifies: rows and columns stay in the order received.

use serde::Serialize;
use std::fmt::Display;

/// Header row plus stringified cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A table, or the "no data" indicator when there is nothing to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rendered {
    Table(DisplayTable),
    NoData,
}

pub fn render<T: Display>(columns: &[String], rows: &[Vec<T>]) -> Rendered {
    if columns.is_empty() || rows.is_empty() {
        return Rendered::NoData;
    }

    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    Rendered::Table(DisplayTable {
        headers: columns.to_vec(),
        rows,
    })
}

impl Rendered {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Rendered::NoData)
    }

    pub fn table(&self) -> Option<&DisplayTable> {
        match self {
            Rendered::Table(table) => Some(table),
            Rendered::NoData => None,
        }
    }

    /// HTML for the page; empty for `NoData`, which the page reports separately.
    pub fn to_html(&self) -> String {
        self.table().map(DisplayTable::to_html).unwrap_or_default()
    }
}

impl DisplayTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn to_html(&self) -> String {
        let header_html: String = self
            .headers
            .iter()
            .map(|header| format!("<th>{}</th>", escape_html(header)))
            .collect();

        let rows_html: String = self
            .rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|cell| format!("<td>{}</td>", escape_html(cell)))
                    .collect();
                format!("<tr>{}</tr>", cells)
            })
            .collect();

        format!(
            "<table class=\"custom-table\"><thead><tr>{}</tr></thead><tbody>{}</tbody></table>",
            header_html, rows_html
        )
    }

    /// Column-aligned plain text for terminals.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(idx) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let format_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let separator = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-");

        let mut lines = vec![format_line(self.headers.as_slice()), separator];
        lines.extend(self.rows.iter().map(|row| format_line(row.as_slice())));
        lines.join("\n")
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_render_shape_and_order() {
        let rows = vec![vec![3, 1, 2], vec![9, 8, 7]];
        let rendered = render(&cols(&["C", "A", "B"]), &rows);
        let table = rendered.table().unwrap();
        assert_eq!(table.headers, cols(&["C", "A", "B"]));
        assert_eq!(table.row_count(), 2);
        assert!(table.rows.iter().all(|row| row.len() == 3));
        assert_eq!(table.rows[0], cols(&["3", "1", "2"]));
        assert_eq!(table.rows[1], cols(&["9", "8", "7"]));
    }

    #[test]
    fn test_render_no_data() {
        let empty: Vec<Vec<i64>> = Vec::new();
        assert_eq!(render(&[], &empty), Rendered::NoData);
        assert_eq!(render(&cols(&["A"]), &empty), Rendered::NoData);
        assert_eq!(Rendered::NoData.to_html(), "");
    }

    #[test]
    fn test_render_single_count_cell() {
        let rendered = render(&cols(&["COUNT(*)"]), &[vec![5]]);
        assert_eq!(
            rendered.to_html(),
            "<table class=\"custom-table\"><thead><tr><th>COUNT(*)</th></tr></thead>\
             <tbody><tr><td>5</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_html_escapes_cells_and_headers() {
        let rendered = render(
            &cols(&["<b>"]),
            &[vec!["<script>alert('x')</script> & \"more\""]],
        );
        let html = rendered.to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("<th>&lt;b&gt;</th>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; &quot;more&quot;"));
    }

    #[test]
    fn test_text_table_alignment() {
        let rendered = render(&cols(&["NAME", "MARKS"]), &[vec!["Ville", "100"], vec!["Al", "5"]]);
        let text = rendered.table().unwrap().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "NAME  | MARKS");
        assert_eq!(lines[1], "------+------");
        assert_eq!(lines[2], "Ville | 100");
        assert_eq!(lines[3], "Al    | 5");
    }

    #[test]
    fn test_rendered_serializes_with_kind() {
        let json = serde_json::to_value(Rendered::NoData).unwrap();
        assert_eq!(json["kind"], "no_data");
        let json = serde_json::to_value(render(&cols(&["A"]), &[vec![1]])).unwrap();
        assert_eq!(json["kind"], "table");
        assert_eq!(json["headers"][0], "A");
    }
}

//! Plain data tables shown alongside charts.

use serde::Serialize;

use crate::views::html_escape;

/// A small table of preformatted cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    /// DOM-safe identifier, unique within a page.
    pub id: String,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row drawn as selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_row: Option<usize>,
}

impl TableSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            highlight_row: None,
        }
    }

    /// Append a row. Short rows are padded with empty cells.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }

    pub fn with_highlight(mut self, row: Option<usize>) -> Self {
        self.highlight_row = row.filter(|r| *r < self.rows.len());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `<table>` markup with every cell escaped.
    pub fn to_html(&self) -> String {
        let head: String = self
            .columns
            .iter()
            .map(|c| format!("<th>{}</th>", html_escape(c)))
            .collect();
        let body: String = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let class = if self.highlight_row == Some(i) {
                    r#" class="selected""#
                } else {
                    ""
                };
                let cells: String = row
                    .iter()
                    .map(|c| format!("<td>{}</td>", html_escape(c)))
                    .collect();
                format!("<tr{}>{}</tr>", class, cells)
            })
            .collect();
        format!(
            r#"<table id="table-{id}" class="data-table"><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>"#,
            id = html_escape(&self.id),
            head = head,
            body = body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_padded_and_escaped() {
        let mut table = TableSpec::new("genes", "Genes", &["Gene", "Note"]);
        table.push_row(vec!["<CD8A>".into()]);
        assert_eq!(table.rows[0], vec!["<CD8A>".to_string(), String::new()]);

        let html = table.to_html();
        assert!(html.contains("<td>&lt;CD8A&gt;</td><td></td>"));
        assert!(html.starts_with(r#"<table id="table-genes""#));
    }

    #[test]
    fn test_highlight_out_of_range_is_dropped() {
        let mut table = TableSpec::new("t", "T", &["A"]);
        table.push_row(vec!["x".into()]);
        assert_eq!(table.clone().with_highlight(Some(3)).highlight_row, None);

        let table = table.with_highlight(Some(0));
        assert!(table.to_html().contains(r#"<tr class="selected"><td>x</td>"#));
    }
}

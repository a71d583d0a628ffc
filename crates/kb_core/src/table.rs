use crate::record::{DocArticle, DEFAULT_ARTICLE_TITLE, DEFAULT_CATEGORY};
use crate::sanitize::strip;
use crate::SchemaError;

/// Columns the help-center export must carry, checked once per table.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "docs_status",
    "docs_title",
    "category_title",
    "docs_description",
    "docs_seo_meta_description",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One raw row of the export. Cells missing from a short row read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleRow {
    pub status: String,
    pub title: String,
    pub category: String,
    pub description_html: String,
    pub meta_description_html: String,
}

/// Rows of a help-center export, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleTable {
    rows: Vec<ArticleRow>,
}

impl ArticleTable {
    pub fn from_rows(rows: Vec<ArticleRow>) -> Self {
        Self { rows }
    }

    /// Read a UTF-8 CSV export with a header line.
    ///
    /// Fails with [`SchemaError::MissingColumns`] before reading any row when
    /// a required column is absent from the header.
    pub fn from_csv(data: &[u8]) -> Result<Self, SchemaError> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers = reader
            .headers()
            .map_err(|err| SchemaError::Unreadable(err.to_string()))?
            .clone();

        // Header index of each required column, in REQUIRED_COLUMNS order.
        let mut columns = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();
        for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
            match headers.iter().position(|header| header == name) {
                Some(index) => *slot = index,
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns { missing });
        }

        let [status, title, category, description, meta_description] = columns;
        let rows = reader
            .records()
            .map(|record| -> Result<ArticleRow, SchemaError> {
                let record = record.map_err(|err| SchemaError::Unreadable(err.to_string()))?;
                let cell = |index: usize| record.get(index).unwrap_or("").to_string();
                Ok(ArticleRow {
                    status: cell(status),
                    title: cell(title),
                    category: cell(category),
                    description_html: cell(description),
                    meta_description_html: cell(meta_description),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ArticleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep published rows only and normalize them into articles, in row order.
pub fn extract_articles(table: &ArticleTable) -> Vec<DocArticle> {
    table
        .rows()
        .iter()
        .filter(|row| is_published(&row.status))
        .map(|row| DocArticle {
            title: non_empty_or(&row.title, DEFAULT_ARTICLE_TITLE),
            category: non_empty_or(&row.category, DEFAULT_CATEGORY),
            summary: stripped(&row.meta_description_html),
            body: stripped(&row.description_html),
            status: row.status.clone(),
        })
        .collect()
}

fn is_published(status: &str) -> bool {
    status.eq_ignore_ascii_case("published")
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn stripped(html: &str) -> Option<String> {
    let text = strip(html);
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_match_ignores_case_but_not_padding() {
        assert!(is_published("PUBLISHED"));
        assert!(is_published("Published"));
        assert!(!is_published(" published"));
        assert!(!is_published(""));
    }

    #[test]
    fn bom_does_not_hide_the_first_column() {
        let csv = "\u{feff}docs_status,docs_title,category_title,docs_description,docs_seo_meta_description\npublished,T,C,<p>d</p>,\n";
        let table = ArticleTable::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.rows()[0].status, "published");
    }
}

//! Text layouts for the two target documents.
//!
//! Both layouts are pure functions of the records, the calendar date and
//! the [`RenderOptions`]. The catalog groups by product type in
//! lexicographic order; the documentation layout keeps row order and has no
//! total line.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::record::{DocArticle, DocumentKind, ProductRecord};
use crate::RenderError;

/// Fixed strings of both layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub catalog_title: String,
    /// Line under the date; omitted when empty.
    pub catalog_intro: String,
    pub currency: String,
    pub docs_banner: String,
    pub rule_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            catalog_title: "Portable Spas Product Catalog".to_string(),
            catalog_intro:
                "This document contains the current product catalog for Portable Spas New Zealand."
                    .to_string(),
            currency: "NZD".to_string(),
            docs_banner: "PORTABLE SPAS NEW ZEALAND - DOCUMENTATION AND FAQ".to_string(),
            rule_width: 80,
        }
    }
}

/// Input of [`render`]: the canonical records of one run.
#[derive(Debug, Clone, Copy)]
pub enum Records<'a> {
    Products(&'a [ProductRecord]),
    Articles(&'a [DocArticle]),
}

impl Records<'_> {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Records::Products(_) => DocumentKind::ProductCatalog,
            Records::Articles(_) => DocumentKind::Documentation,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Products(products) => products.len(),
            Records::Articles(articles) => articles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The finished artifact of one run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    kind: DocumentKind,
    title: String,
    generated_on: NaiveDate,
    record_count: usize,
    sections: Vec<String>,
    text: String,
}

impl RenderedDocument {
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn generated_on(&self) -> NaiveDate {
        self.generated_on
    }

    /// Number of records rendered, whether or not the layout prints it.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Section headings in output order: product types for the catalog,
    /// article titles for the documentation.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Dated artifact name, e.g. `product-catalog-2025-10-01.md`.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.kind.file_stem(),
            self.generated_on.format("%Y-%m-%d"),
            self.kind.file_extension()
        )
    }
}

/// Render `records` with the layout matching their kind.
pub fn render(
    records: Records<'_>,
    today: NaiveDate,
    options: &RenderOptions,
) -> Result<RenderedDocument, RenderError> {
    match records {
        Records::Products(products) => render_catalog(products, today, options),
        Records::Articles(articles) => Ok(render_documentation(articles, today, options)),
    }
}

/// Partition products by type. Keys iterate in lexicographic order and each
/// group keeps extraction order.
pub fn group_by_type(products: &[ProductRecord]) -> BTreeMap<&str, Vec<&ProductRecord>> {
    products.iter().fold(BTreeMap::new(), |mut groups, product| {
        groups
            .entry(product.product_type.as_str())
            .or_insert_with(Vec::new)
            .push(product);
        groups
    })
}

pub fn render_catalog(
    products: &[ProductRecord],
    today: NaiveDate,
    options: &RenderOptions,
) -> Result<RenderedDocument, RenderError> {
    if let Some(product) = products.iter().find(|p| p.product_type.is_empty()) {
        return Err(RenderError::EmptyGroupKey {
            title: product.title.clone(),
        });
    }

    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", options.catalog_title));
    md.push_str(&format!("*Last updated: {}*\n\n", today.format("%Y-%m-%d")));
    if !options.catalog_intro.is_empty() {
        md.push_str(&format!("{}\n\n", options.catalog_intro));
    }
    md.push_str(&format!("Total products: {}\n\n", products.len()));
    md.push_str("---\n\n");

    let groups = group_by_type(products);
    let mut sections = Vec::with_capacity(groups.len());
    for (product_type, members) in &groups {
        sections.push(product_type.to_string());
        md.push_str(&format!("## {product_type}\n\n"));
        for product in members {
            write_product(&mut md, product, &options.currency);
        }
    }

    Ok(RenderedDocument {
        kind: DocumentKind::ProductCatalog,
        title: options.catalog_title.clone(),
        generated_on: today,
        record_count: products.len(),
        sections,
        text: md,
    })
}

fn write_product(md: &mut String, product: &ProductRecord, currency: &str) {
    md.push_str(&format!("### {}\n\n", product.title));
    if let Some(price) = &product.price {
        md.push_str(&format!("**Price:** ${price} {currency}\n\n"));
    }
    md.push_str(&format!("**Product Page:** {}\n\n", product.link));
    if let Some(sku) = &product.sku {
        md.push_str(&format!("**SKU:** {sku}\n\n"));
    }
    if !product.tags.is_empty() {
        md.push_str(&format!("**Tags:** {}\n\n", product.tags.join(", ")));
    }
    if !product.description.is_empty() {
        md.push_str(&format!("{}\n\n", product.description));
    }
    md.push_str("---\n\n");
}

pub fn render_documentation(
    articles: &[DocArticle],
    today: NaiveDate,
    options: &RenderOptions,
) -> RenderedDocument {
    let heavy = "=".repeat(options.rule_width);
    let light = "-".repeat(options.rule_width);

    let mut txt = String::new();
    txt.push_str(&format!("{}\n{heavy}\n\n", options.docs_banner));

    let mut sections = Vec::with_capacity(articles.len());
    for article in articles {
        sections.push(article.title.clone());
        txt.push_str(&format!("\n{heavy}\n"));
        txt.push_str(&format!("Title: {}\n", article.title));
        txt.push_str(&format!("Category: {}\n", article.category));
        txt.push_str(&format!("{light}\n\n"));
        if let Some(summary) = &article.summary {
            txt.push_str(&format!("Summary: {summary}\n\n"));
        }
        if let Some(body) = &article.body {
            txt.push_str(&format!("{body}\n"));
        }
        txt.push_str(&format!("\n{heavy}\n"));
    }

    RenderedDocument {
        kind: DocumentKind::Documentation,
        title: options.docs_banner.clone(),
        generated_on: today,
        record_count: articles.len(),
        sections,
        text: txt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(title: &str, product_type: &str) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            product_type: product_type.to_string(),
            ..ProductRecord::default()
        }
    }

    #[test]
    fn grouping_partitions_without_loss_or_duplication() {
        let products = vec![
            product("a", "Spas"),
            product("b", "Accessories"),
            product("c", "Spas"),
            product("d", "Chemicals"),
            product("e", "Accessories"),
        ];
        let groups = group_by_type(&products);

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, products.len());
        for p in &products {
            let hits = groups
                .values()
                .flatten()
                .filter(|member| std::ptr::eq(**member, p))
                .count();
            assert_eq!(hits, 1, "{} should appear exactly once", p.title);
        }
    }

    #[test]
    fn groups_are_sorted_and_members_keep_source_order() {
        let products = vec![
            product("first spa", "Spas"),
            product("filter", "Accessories"),
            product("chlorine", "Chemicals"),
            product("second spa", "Spas"),
        ];
        let groups = group_by_type(&products);

        let keys: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["Accessories", "Chemicals", "Spas"]);
        let spa_titles: Vec<&str> = groups["Spas"].iter().map(|p| p.title.as_str()).collect();
        assert_eq!(spa_titles, vec!["first spa", "second spa"]);
    }

    #[test]
    fn file_name_carries_kind_and_date() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let doc = render_documentation(&[], today, &RenderOptions::default());
        assert_eq!(doc.file_name(), "documentation-2025-10-01.txt");
    }
}

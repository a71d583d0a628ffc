use std::fmt;

pub const DEFAULT_PRODUCT_TITLE: &str = "Unknown";
pub const DEFAULT_PRODUCT_TYPE: &str = "Other";
pub const DEFAULT_ARTICLE_TITLE: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "General";

/// One catalog item as read from the product feed.
///
/// `product_type` is the grouping key of the catalog layout and is never
/// empty when produced by [`crate::extract_products`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub title: String,
    pub link: String,
    pub price: Option<String>,
    pub sku: Option<String>,
    pub product_type: String,
    pub vendor: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl Default for ProductRecord {
    fn default() -> Self {
        Self {
            title: DEFAULT_PRODUCT_TITLE.to_string(),
            link: String::new(),
            price: None,
            sku: None,
            product_type: DEFAULT_PRODUCT_TYPE.to_string(),
            vendor: String::new(),
            description: String::new(),
            tags: Vec::new(),
        }
    }
}

/// One published help-center article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocArticle {
    pub title: String,
    pub category: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub status: String,
}

/// Which target document a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    ProductCatalog,
    Documentation,
}

impl DocumentKind {
    /// Value of the `source` upload metadata key.
    pub fn source_tag(self) -> &'static str {
        match self {
            DocumentKind::ProductCatalog => "shopify_atom_feed",
            DocumentKind::Documentation => "betterdocs_csv",
        }
    }

    /// Value of the `type` upload metadata key.
    pub fn type_tag(self) -> &'static str {
        match self {
            DocumentKind::ProductCatalog => "product_catalog",
            DocumentKind::Documentation => "documentation",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            DocumentKind::ProductCatalog => "product-catalog",
            DocumentKind::Documentation => "documentation",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            DocumentKind::ProductCatalog => "md",
            DocumentKind::Documentation => "txt",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::ProductCatalog => write!(f, "product catalog"),
            DocumentKind::Documentation => write!(f, "documentation"),
        }
    }
}

//! Knowledge-base core: pure normalization from source formats to rendered documents.
mod error;
mod feed;
mod record;
mod render;
mod sanitize;
mod table;

pub use error::{ParseError, RenderError, SchemaError};
pub use feed::{extract_description, extract_products, ATOM_NS, SHOPIFY_NS};
pub use record::{
    DocArticle, DocumentKind, ProductRecord, DEFAULT_ARTICLE_TITLE, DEFAULT_CATEGORY,
    DEFAULT_PRODUCT_TITLE, DEFAULT_PRODUCT_TYPE,
};
pub use render::{
    group_by_type, render, render_catalog, render_documentation, Records, RenderOptions,
    RenderedDocument,
};
pub use sanitize::strip;
pub use table::{extract_articles, ArticleRow, ArticleTable, REQUIRED_COLUMNS};

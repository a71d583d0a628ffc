//! Atom product feed with Shopify namespace extensions.
//!
//! Only direct children of the root are considered entries, and only direct
//! children of an entry are considered fields (plus price/SKU inside the
//! first `s:variant`). The first occurrence of a single-valued field wins.

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use regex::Regex;

use crate::record::{ProductRecord, DEFAULT_PRODUCT_TITLE, DEFAULT_PRODUCT_TYPE};
use crate::sanitize::strip;
use crate::ParseError;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const SHOPIFY_NS: &str = "http://jadedpixel.com/-/spec/shopify";

static DESCRIPTION_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<td colspan="2">(.*?)</td>"#).expect("cell pattern"));
static METADATA_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Vendor:|Type:|Price:).*?(?:\n|$)").expect("label pattern"));

/// Parse an Atom product feed into catalog records, in feed order.
///
/// A feed without entries yields an empty list. Any document that is not
/// well-formed is an error: a second root, text outside the root, a bad
/// entity anywhere, or an element with an undeclared prefix.
pub fn extract_products(raw: &[u8]) -> Result<Vec<ProductRecord>, ParseError> {
    let mut reader = NsReader::from_reader(raw);
    let mut walker = FeedWalker::default();

    loop {
        let step = match reader.read_resolved_event() {
            Ok((resolved, event)) => match resolved {
                ResolveResult::Unknown(prefix) => Err(format!(
                    "undeclared namespace prefix `{}`",
                    String::from_utf8_lossy(&prefix)
                )),
                bound => Ok((Ns::from(&bound), event)),
            },
            Err(err) => {
                return Err(ParseError::new(
                    position(reader.error_position()),
                    err.to_string(),
                ))
            }
        };
        let at = position(reader.buffer_position());
        let (ns, event) = step.map_err(|msg| ParseError::new(at, msg))?;
        match event {
            Event::Start(start) => {
                walker.open(ns, &start).map_err(|msg| ParseError::new(at, msg))?;
            }
            Event::Empty(start) => {
                walker.open(ns, &start).map_err(|msg| ParseError::new(at, msg))?;
                walker.close();
            }
            Event::End(_) => walker.close(),
            Event::Text(text) => {
                if walker.depth == 0 && !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(ParseError::new(at, "text outside the root element"));
                }
                let text = text
                    .unescape()
                    .map_err(|err| ParseError::new(at, err.to_string()))?;
                if walker.is_capturing() {
                    walker.push_text(&text);
                }
            }
            Event::CData(cdata) => {
                if walker.is_capturing() {
                    let text = reader
                        .decoder()
                        .decode(&cdata)
                        .map_err(|err| ParseError::new(at, err.to_string()))?;
                    walker.push_text(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let at = position(reader.buffer_position());
    if !walker.saw_root {
        return Err(ParseError::new(at, "no root element"));
    }
    if walker.depth != 0 {
        return Err(ParseError::new(at, "unexpected end of document"));
    }
    Ok(walker.products)
}

/// Pull the marketing copy out of an entry summary.
///
/// Prefers the `<td colspan="2">` cell and drops `Vendor:`/`Type:`/`Price:`
/// label lines from it; otherwise strips the whole summary.
pub fn extract_description(summary: &str) -> String {
    if summary.is_empty() {
        return String::new();
    }
    match DESCRIPTION_CELL.captures(summary) {
        Some(caps) => {
            let desc = strip(&caps[1]);
            METADATA_LABEL.replace_all(&desc, "").trim().to_string()
        }
        None => strip(summary),
    }
}

fn position<T: TryInto<u64>>(pos: T) -> u64 {
    pos.try_into().unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Atom,
    Shopify,
    Other,
}

impl From<&ResolveResult<'_>> for Ns {
    fn from(value: &ResolveResult<'_>) -> Self {
        match value {
            ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS.as_bytes() => Ns::Atom,
            ResolveResult::Bound(Namespace(uri)) if *uri == SHOPIFY_NS.as_bytes() => Ns::Shopify,
            _ => Ns::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Type,
    Vendor,
    Tag,
    Price,
    Sku,
}

#[derive(Debug, Default)]
struct VariantFields {
    price: Option<String>,
    sku: Option<String>,
}

#[derive(Debug, Default)]
struct EntryFields {
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    product_type: Option<String>,
    vendor: Option<String>,
    tags: Vec<String>,
    variant: Option<VariantFields>,
}

impl EntryFields {
    fn into_record(self) -> ProductRecord {
        let (price, sku) = match self.variant {
            Some(variant) => (
                variant.price.filter(|p| !p.is_empty()),
                variant.sku.filter(|s| !s.is_empty()),
            ),
            None => (None, None),
        };
        ProductRecord {
            title: non_empty_or(self.title, DEFAULT_PRODUCT_TITLE),
            link: self.link.unwrap_or_default(),
            price,
            sku,
            product_type: non_empty_or(self.product_type, DEFAULT_PRODUCT_TYPE),
            vendor: self.vendor.unwrap_or_default(),
            description: self
                .summary
                .as_deref()
                .map(extract_description)
                .unwrap_or_default(),
            tags: self.tags,
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Default)]
struct FeedWalker {
    depth: usize,
    saw_root: bool,
    entry: Option<EntryFields>,
    in_first_variant: bool,
    capture: Option<(Field, usize)>,
    text: String,
    products: Vec<ProductRecord>,
}

impl FeedWalker {
    fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn open(&mut self, ns: Ns, start: &BytesStart<'_>) -> Result<(), String> {
        if self.depth == 0 && self.saw_root {
            return Err("more than one root element".to_string());
        }
        self.depth += 1;
        if self.depth == 1 {
            self.saw_root = true;
            return Ok(());
        }
        if self.capture.is_some() {
            return Ok(());
        }
        let local = start.local_name();
        let name = local.as_ref();
        let depth = self.depth;

        if depth == 2 {
            if ns == Ns::Atom && name == b"entry" {
                self.entry = Some(EntryFields::default());
            }
            return Ok(());
        }

        let Some(entry) = self.entry.as_mut() else {
            return Ok(());
        };

        let field = match (depth, ns, name) {
            (3, Ns::Atom, b"title") if entry.title.is_none() => Some(Field::Title),
            (3, Ns::Atom, b"summary") if entry.summary.is_none() => Some(Field::Summary),
            (3, Ns::Atom, b"link") => {
                if entry.link.is_none() {
                    entry.link = alternate_href(start)?;
                }
                None
            }
            (3, Ns::Shopify, b"type") if entry.product_type.is_none() => Some(Field::Type),
            (3, Ns::Shopify, b"vendor") if entry.vendor.is_none() => Some(Field::Vendor),
            (3, Ns::Shopify, b"tag") => Some(Field::Tag),
            (3, Ns::Shopify, b"variant") if entry.variant.is_none() => {
                entry.variant = Some(VariantFields::default());
                self.in_first_variant = true;
                None
            }
            (4, Ns::Shopify, b"price") if self.in_first_variant => {
                let unset = entry.variant.as_ref().is_some_and(|v| v.price.is_none());
                unset.then_some(Field::Price)
            }
            (4, Ns::Shopify, b"sku") if self.in_first_variant => {
                let unset = entry.variant.as_ref().is_some_and(|v| v.sku.is_none());
                unset.then_some(Field::Sku)
            }
            _ => None,
        };

        if let Some(field) = field {
            self.text.clear();
            self.capture = Some((field, depth));
        }
        Ok(())
    }

    fn close(&mut self) {
        let depth = self.depth;
        self.depth = depth.saturating_sub(1);

        if let Some((field, at)) = self.capture {
            if at != depth {
                return;
            }
            self.capture = None;
            let text = std::mem::take(&mut self.text);
            self.store(field, text);
            return;
        }

        match depth {
            2 => {
                if let Some(entry) = self.entry.take() {
                    self.products.push(entry.into_record());
                }
            }
            3 => self.in_first_variant = false,
            _ => {}
        }
    }

    fn store(&mut self, field: Field, text: String) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        match field {
            Field::Summary => entry.summary = Some(text),
            Field::Title => entry.title = Some(text.trim().to_string()),
            Field::Type => entry.product_type = Some(text.trim().to_string()),
            Field::Vendor => entry.vendor = Some(text.trim().to_string()),
            Field::Tag => entry.tags.push(text.trim().to_string()),
            Field::Price => {
                if let Some(variant) = entry.variant.as_mut() {
                    variant.price = Some(text.trim().to_string());
                }
            }
            Field::Sku => {
                if let Some(variant) = entry.variant.as_mut() {
                    variant.sku = Some(text.trim().to_string());
                }
            }
        }
    }
}

fn alternate_href(start: &BytesStart<'_>) -> Result<Option<String>, String> {
    let mut rel = None;
    let mut href = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        match attr.key.local_name().as_ref() {
            b"rel" => rel = Some(attr.unescape_value().map_err(|err| err.to_string())?),
            b"href" => href = Some(attr.unescape_value().map_err(|err| err.to_string())?),
            _ => {}
        }
    }
    if rel.as_deref() == Some("alternate") {
        Ok(Some(href.map(|h| h.into_owned()).unwrap_or_default()))
    } else {
        Ok(None)
    }
}

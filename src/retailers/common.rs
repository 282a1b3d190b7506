//! Parsing helpers shared by the retailer extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Availability, Deal};

/// Phrases that mark a listing as not purchasable.
pub const NEGATIVE_STOCK_KEYWORDS: &[&str] =
    &["out of stock", "unavailable", "sold out", "coming soon"];

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());

static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

static NULL: Value = Value::Null;

/// Why a single listing was skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Skip {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("unparseable price {0:?}")]
    BadPrice(String),
}

/// Parse the first number in a price string, ignoring currency symbols
/// and thousands separators.
pub fn parse_price(text: &str) -> Option<f64> {
    let m = PRICE_NUMBER.find(text)?;
    let price: f64 = m.as_str().replace(',', "").parse().ok()?;
    (price.is_finite() && price > 0.0).then_some(price)
}

/// Price from a JSON number or numeric string.
pub fn json_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p > 0.0),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

/// Availability from free text: any negative stock phrase means out of stock.
pub fn availability_from_text(text: &str) -> Availability {
    let lower = text.to_lowercase();
    if NEGATIVE_STOCK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Availability::OutOfStock
    } else {
        Availability::InStock
    }
}

/// Availability from a schema.org availability URL or label.
pub fn availability_from_schema(value: &str) -> Availability {
    let lower = value.to_lowercase();
    if lower.contains("outofstock") || lower.contains("soldout") || lower.contains("discontinued")
    {
        Availability::OutOfStock
    } else if lower.contains("limitedavailability") {
        Availability::LimitedStock
    } else {
        availability_from_text(&lower)
    }
}

/// Collapsed text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first match of `selector` under `element`.
pub fn select_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Resolve a possibly relative link against a retailer base URL.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    if let Ok(base) = url::Url::parse(base_url) {
        if let Ok(resolved) = base.join(path) {
            return resolved.to_string();
        }
    }

    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Extract a value from nested JSON using a dot-notation path.
pub fn extract_path<'a>(data: &'a Value, path: &str) -> &'a Value {
    if path.is_empty() {
        return data;
    }

    let mut current = data;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key).unwrap_or(&NULL),
            Value::Array(arr) => match key.parse::<usize>() {
                Ok(idx) => arr.get(idx).unwrap_or(&NULL),
                Err(_) => &NULL,
            },
            _ => &NULL,
        };
    }

    current
}

fn is_product(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

fn collect_products(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_products(v, out)),
        Value::Object(map) => {
            if is_product(value) {
                out.push(value.clone());
                return;
            }
            if let Some(graph) = map.get("@graph") {
                collect_products(graph, out);
            }
            if let Some(Value::Array(elements)) = map.get("itemListElement") {
                for element in elements {
                    collect_products(element.get("item").unwrap_or(element), out);
                }
            }
        }
        _ => {}
    }
}

/// All schema.org `Product` objects embedded as JSON-LD, in document order.
///
/// Blocks that fail to parse are ignored.
pub fn json_ld_products(document: &Html) -> Vec<Value> {
    let mut products = Vec::new();
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
            collect_products(&value, &mut products);
        }
    }
    products
}

/// Build a deal from a JSON-LD `Product`. Relative links resolve against
/// `base_url`; a product without one links to `page_url`.
pub fn deal_from_json_ld(
    retailer: &str,
    base_url: &str,
    page_url: &str,
    product: &Value,
) -> Result<Deal, Skip> {
    let offers = match product.get("offers") {
        Some(Value::Array(list)) => list.first().unwrap_or(&NULL),
        Some(offer) => offer,
        None => return Err(Skip::Missing("offers")),
    };

    let price_value = [offers.get("price"), offers.get("lowPrice")]
        .into_iter()
        .flatten()
        .next()
        .ok_or(Skip::Missing("price"))?;
    let price = json_price(price_value).ok_or_else(|| Skip::BadPrice(price_value.to_string()))?;

    let link = offers
        .get("url")
        .or_else(|| product.get("url"))
        .and_then(Value::as_str)
        .map(|u| resolve_url(base_url, u))
        .unwrap_or_else(|| page_url.to_string());

    let availability = offers
        .get("availability")
        .and_then(Value::as_str)
        .map(availability_from_schema)
        .unwrap_or_default();

    let deal = Deal::new(retailer, price, None, link)
        .map_err(|_| Skip::BadPrice(price_value.to_string()))?
        .with_availability(availability);

    Ok(match product.get("name").and_then(Value::as_str) {
        Some(name) => deal.with_title(name),
        None => deal,
    })
}

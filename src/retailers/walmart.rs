//! Walmart search results.
//!
//! Walmart renders with Next.js, so results are normally read from the
//! `__NEXT_DATA__` payload. JSON-LD and markup are fallbacks.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::common::{
    availability_from_text, deal_from_json_ld, element_text, extract_path, json_ld_products,
    json_price, parse_price, resolve_url, select_text, Skip,
};
use super::{Extraction, RetailerExtractor};
use crate::models::{Availability, Deal};

const BASE_URL: &str = "https://www.walmart.com";

/// Location of result stacks inside `__NEXT_DATA__`.
const ITEM_STACKS_PATH: &str = "props.pageProps.initialData.searchResult.itemStacks";

mod selectors {
    use super::*;

    pub static NEXT_DATA: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("script#__NEXT_DATA__").unwrap());

    pub static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[data-item-id]").unwrap());

    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(r#"[data-automation-id="product-title"], span.lh-title"#).unwrap()
    });

    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"[data-automation-id="product-price"]"#).unwrap());

    pub static WAS_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.strike, [data-automation-id=\"strikethrough-price\"]").unwrap());

    pub static LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"a[href*="/ip/"]"#).unwrap());
}

pub struct Walmart;

/// Flatten item stacks into individual product objects.
fn stack_items(stacks: &Value) -> Vec<&Value> {
    let mut items = Vec::new();
    for stack in stacks.as_array().into_iter().flatten() {
        match stack.get("items").and_then(Value::as_array) {
            Some(list) => items.extend(list.iter()),
            None => items.push(stack),
        }
    }

    items
        .into_iter()
        .map(|item| item.get("item").unwrap_or(item))
        .filter(|item| match item.get("__typename").and_then(Value::as_str) {
            Some(kind) => kind == "Product",
            None => true,
        })
        .collect()
}

impl Walmart {
    fn first_price(item: &Value, paths: &[&str]) -> Option<f64> {
        paths.iter().find_map(|path| json_price(extract_path(item, path)))
    }

    fn parse_next_item(&self, item: &Value, page_url: &str) -> Result<Deal, Skip> {
        let price = Self::first_price(
            item,
            &["priceInfo.currentPrice.price", "priceInfo.currentPrice", "price"],
        )
        .ok_or(Skip::Missing("price"))?;
        let was_price = Self::first_price(item, &["priceInfo.wasPrice.price", "priceInfo.wasPrice"]);

        let url = match (
            item.get("canonicalUrl").and_then(Value::as_str),
            item.get("usItemId").and_then(Value::as_str),
        ) {
            (Some(path), _) => resolve_url(BASE_URL, path),
            (None, Some(id)) => format!("{}/ip/{}", BASE_URL, id),
            (None, None) => page_url.to_string(),
        };

        let availability = ["availabilityStatusV2.display", "availabilityStatusDisplayValue"]
            .iter()
            .find_map(|path| extract_path(item, path).as_str())
            .map(availability_from_text)
            .unwrap_or(Availability::InStock);

        let deal = Deal::new(self.name(), price, was_price, url)
            .map_err(|e| Skip::BadPrice(e.to_string()))?
            .with_availability(availability);

        Ok(match item.get("name").and_then(Value::as_str) {
            Some(name) => deal.with_title(name),
            None => deal,
        })
    }

    fn from_next_data(&self, document: &Html, page_url: &str, max_results: usize) -> Extraction {
        let Some(script) = document.select(&selectors::NEXT_DATA).next() else {
            return Extraction::default();
        };
        let raw = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(raw.trim()) else {
            return Extraction::default();
        };

        let items = stack_items(extract_path(&data, ITEM_STACKS_PATH));
        Extraction::collect(
            self.name(),
            items.into_iter().map(|item| self.parse_next_item(item, page_url)),
            max_results,
        )
    }

    fn parse_tile(&self, tile: ElementRef<'_>, page_url: &str) -> Result<Deal, Skip> {
        let title = select_text(tile, &selectors::TITLE).ok_or(Skip::Missing("title"))?;
        let price_text = select_text(tile, &selectors::PRICE).ok_or(Skip::Missing("price"))?;
        let price = parse_price(&price_text).ok_or(Skip::BadPrice(price_text))?;
        let was_price = select_text(tile, &selectors::WAS_PRICE).and_then(|t| parse_price(&t));

        let url = tile
            .select(&selectors::LINK)
            .find_map(|a| a.value().attr("href"))
            .map(|href| resolve_url(BASE_URL, href.split('?').next().unwrap_or(href)))
            .unwrap_or_else(|| page_url.to_string());

        let availability = availability_from_text(&element_text(tile));

        Deal::new(self.name(), price, was_price, url)
            .map(|deal| deal.with_title(&title).with_availability(availability))
            .map_err(|e| Skip::BadPrice(e.to_string()))
    }
}

impl RetailerExtractor for Walmart {
    fn name(&self) -> &str {
        "Walmart"
    }

    fn search_url(&self, product: &str) -> String {
        format!("{}/search?q={}", BASE_URL, urlencoding::encode(product))
    }

    fn wait_hint(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn extract(&self, content: &str, page_url: &str, max_results: usize) -> Extraction {
        let document = Html::parse_document(content);

        self.from_next_data(&document, page_url, max_results)
            .or_else(|| {
                let products = json_ld_products(&document);
                Extraction::collect(
                    self.name(),
                    products
                        .iter()
                        .map(|p| deal_from_json_ld(self.name(), BASE_URL, page_url, p)),
                    max_results,
                )
            })
            .or_else(|| {
                Extraction::collect(
                    self.name(),
                    document
                        .select(&selectors::ITEM)
                        .map(|tile| self.parse_tile(tile, page_url)),
                    max_results,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DealQuality;

    const PAGE_URL: &str = "https://www.walmart.com/search?q=air%20fryer";

    fn next_data_page(stacks: &str) -> String {
        let stacks: Value = serde_json::from_str(stacks).unwrap();
        let data = serde_json::json!({
            "props": {"pageProps": {"initialData": {"searchResult": {"itemStacks": stacks}}}}
        });
        format!(
            r#"<html><body><script id="__NEXT_DATA__" type="application/json">{}</script></body></html>"#,
            data
        )
    }

    #[test]
    fn test_next_data_items() {
        let page = next_data_page(
            r#"[{"items": [
                {"__typename": "Product", "name": "Ninja Air Fryer", "usItemId": "123",
                 "priceInfo": {"currentPrice": {"price": 69.0}, "wasPrice": {"price": 99.0}},
                 "availabilityStatusV2": {"display": "In stock"}},
                {"__typename": "AdPlaceholder"},
                {"__typename": "Product", "name": "Cosori Air Fryer", "canonicalUrl": "/ip/cosori/456",
                 "priceInfo": {"currentPrice": {"price": 89.5}},
                 "availabilityStatusV2": {"display": "Out of stock"}},
                {"__typename": "Product", "name": "No price"}
            ]}]"#,
        );

        let extraction = Walmart.extract(&page, PAGE_URL, 5);
        assert_eq!(extraction.deals.len(), 2);
        assert_eq!(extraction.skipped, 1);

        let ninja = &extraction.deals[0];
        assert_eq!(ninja.url(), "https://www.walmart.com/ip/123");
        assert_eq!(ninja.original_price(), 99.0);
        assert_eq!(ninja.discount_percentage(), 30);
        assert_eq!(ninja.quality(), DealQuality::Excellent);

        let cosori = &extraction.deals[1];
        assert_eq!(cosori.url(), "https://www.walmart.com/ip/cosori/456");
        assert_eq!(cosori.availability(), Availability::OutOfStock);
    }

    #[test]
    fn test_stack_as_item() {
        let page = next_data_page(
            r#"[{"item": {"name": "Legacy shape", "usItemId": "9", "priceInfo": {"currentPrice": 15}}}]"#,
        );
        let extraction = Walmart.extract(&page, PAGE_URL, 5);
        assert_eq!(extraction.deals.len(), 1);
        assert_eq!(extraction.deals[0].price(), 15.0);
    }

    #[test]
    fn test_json_ld_fallback() {
        let page = r#"<html><head>
            <script id="__NEXT_DATA__">{"props": {}}</script>
            <script type="application/ld+json">{"@type": "Product", "name": "LD item",
              "offers": {"price": "42.00", "url": "https://www.walmart.com/ip/42",
                         "availability": "http://schema.org/OutOfStock"}}</script>
        </head></html>"#;
        let extraction = Walmart.extract(page, PAGE_URL, 5);
        assert_eq!(extraction.deals.len(), 1);
        assert_eq!(extraction.deals[0].availability(), Availability::OutOfStock);
    }

    #[test]
    fn test_markup_fallback() {
        let page = r#"<html><body>
            <div data-item-id="777">
              <a href="/ip/Keurig-K-Mini/777?classType=REGULAR">link</a>
              <span data-automation-id="product-title">Keurig K-Mini</span>
              <div data-automation-id="product-price">current price $49.00</div>
              <span class="strike">$79.99</span>
            </div>
        </body></html>"#;
        let extraction = Walmart.extract(page, PAGE_URL, 5);
        assert_eq!(extraction.deals.len(), 1);
        let deal = &extraction.deals[0];
        assert_eq!(deal.price(), 49.0);
        assert_eq!(deal.original_price(), 79.99);
        assert_eq!(deal.url(), "https://www.walmart.com/ip/Keurig-K-Mini/777");
    }
    #[test]
    fn test_unlinked_tile_points_at_search_page() {
        let page = r#"<html><body>
            <div data-item-id="888">
              <span data-automation-id="product-title">Dash Mini Air Fryer</span>
              <div data-automation-id="product-price">$29.96</div>
            </div>
        </body></html>"#;
        let extraction = Walmart.extract(page, PAGE_URL, 5);
        assert_eq!(extraction.deals.len(), 1);
        assert_eq!(extraction.deals[0].url(), PAGE_URL);
    }
}

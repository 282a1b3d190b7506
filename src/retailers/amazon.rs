//! Amazon search results.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::common::{
    availability_from_text, deal_from_json_ld, element_text, json_ld_products, parse_price,
    select_text, Skip,
};
use super::{Extraction, RetailerExtractor};
use crate::models::Deal;

const BASE_URL: &str = "https://www.amazon.com";

mod selectors {
    use super::*;

    pub static RESULT: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(r#"div[data-component-type="s-search-result"]"#).unwrap()
    });

    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());

    pub static PRICE_WHOLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-price-whole").unwrap());

    pub static PRICE_FRACTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-price-fraction").unwrap());

    /// Struck-through list price.
    pub static LIST_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-price.a-text-price span.a-offscreen").unwrap());

    pub static LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("a.a-link-normal.s-no-outline, h2 a.a-link-normal, h2 a").unwrap()
    });
}

static ASIN_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10})").unwrap());

/// Canonical product URL for an Amazon link, keyed on ASIN when present.
pub fn canonical_url(href: &str) -> String {
    let decoded = urlencoding::decode(href)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string());

    if let Some(caps) = ASIN_PATH.captures(&decoded) {
        return format!("{}/dp/{}", BASE_URL, &caps[1]);
    }

    let path = decoded.split('?').next().unwrap_or_default();
    super::common::resolve_url(BASE_URL, path)
}

pub struct Amazon;

impl Amazon {
    fn card_price(card: ElementRef<'_>) -> Result<f64, Skip> {
        let whole = select_text(card, &selectors::PRICE_WHOLE).ok_or(Skip::Missing("price"))?;
        let dollars: String = whole.chars().filter(|c| c.is_ascii_digit()).collect();
        let cents: String = select_text(card, &selectors::PRICE_FRACTION)
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();

        let text = if cents.is_empty() {
            dollars
        } else {
            format!("{}.{}", dollars, cents)
        };
        parse_price(&text).ok_or(Skip::BadPrice(whole))
    }

    fn parse_card(&self, card: ElementRef<'_>, page_url: &str) -> Result<Deal, Skip> {
        let title = select_text(card, &selectors::TITLE).ok_or(Skip::Missing("title"))?;
        let price = Self::card_price(card)?;
        let list_price = select_text(card, &selectors::LIST_PRICE).and_then(|t| parse_price(&t));

        let url = card
            .select(&selectors::LINK)
            .find_map(|a| a.value().attr("href"))
            .map(canonical_url)
            .or_else(|| {
                card.value()
                    .attr("data-asin")
                    .filter(|asin| !asin.is_empty())
                    .map(|asin| format!("{}/dp/{}", BASE_URL, asin))
            })
            .unwrap_or_else(|| page_url.to_string());

        let availability = availability_from_text(&element_text(card));

        Deal::new(self.name(), price, list_price, url)
            .map(|deal| deal.with_title(&title).with_availability(availability))
            .map_err(|e| Skip::BadPrice(e.to_string()))
    }
}

impl RetailerExtractor for Amazon {
    fn name(&self) -> &str {
        "Amazon"
    }

    fn search_url(&self, product: &str) -> String {
        format!("{}/s?k={}", BASE_URL, urlencoding::encode(product))
    }

    fn wait_hint(&self) -> Duration {
        Duration::from_secs(3)
    }

    fn extract(&self, content: &str, page_url: &str, max_results: usize) -> Extraction {
        let document = Html::parse_document(content);

        let products = json_ld_products(&document);
        let structured = Extraction::collect(
            self.name(),
            products
                .iter()
                .map(|p| deal_from_json_ld(self.name(), BASE_URL, page_url, p)),
            max_results,
        );

        structured.or_else(|| {
            Extraction::collect(
                self.name(),
                document
                    .select(&selectors::RESULT)
                    .map(|card| self.parse_card(card, page_url)),
                max_results,
            )
        })
    }
}

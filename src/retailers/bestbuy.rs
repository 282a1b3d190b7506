//! Best Buy search results.

use std::sync::LazyLock;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use super::common::{
    availability_from_text, deal_from_json_ld, element_text, json_ld_products, parse_price,
    resolve_url, select_text, Skip,
};
use super::{Extraction, RetailerExtractor};
use crate::models::Deal;

const BASE_URL: &str = "https://www.bestbuy.com";

mod selectors {
    use super::*;

    pub static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("li.product-list-item, li.sku-item").unwrap());

    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h2.product-title, h4.sku-title").unwrap());

    /// Current price. The first dollar amount in the price block.
    pub static PRICE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            r#"[data-testid="customer-price"], div.priceView-customer-price span, div.pricing-price"#,
        )
        .unwrap()
    });

    /// "Was" price shown next to a sale price.
    pub static WAS_PRICE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(r#"[data-testid="regular-price"], div.pricing-price__regular-price"#)
            .unwrap()
    });

    pub static LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("a.product-list-item-link, h4.sku-title a, h2.product-title a").unwrap()
    });
}

pub struct BestBuy;

impl BestBuy {
    fn parse_item(&self, item: ElementRef<'_>, page_url: &str) -> Result<Deal, Skip> {
        let title = select_text(item, &selectors::TITLE).ok_or(Skip::Missing("title"))?;
        let price_text = select_text(item, &selectors::PRICE).ok_or(Skip::Missing("price"))?;
        let price = parse_price(&price_text).ok_or(Skip::BadPrice(price_text))?;
        let was_price = select_text(item, &selectors::WAS_PRICE).and_then(|t| parse_price(&t));

        let url = item
            .select(&selectors::LINK)
            .find_map(|a| a.value().attr("href"))
            .map(|href| resolve_url(BASE_URL, href))
            .unwrap_or_else(|| page_url.to_string());

        let availability = availability_from_text(&element_text(item));

        Deal::new(self.name(), price, was_price, url)
            .map(|deal| deal.with_title(&title).with_availability(availability))
            .map_err(|e| Skip::BadPrice(e.to_string()))
    }
}

impl RetailerExtractor for BestBuy {
    fn name(&self) -> &str {
        "Best Buy"
    }

    fn search_url(&self, product: &str) -> String {
        format!(
            "{}/site/searchpage.jsp?st={}",
            BASE_URL,
            urlencoding::encode(product)
        )
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
                    .select(&selectors::ITEM)
                    .map(|item| self.parse_item(item, page_url)),
                max_results,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, DealQuality};

    const SEARCH_PAGE: &str = r#"
    <html><body><ol>
      <li class="product-list-item product-list-item-gridView">
        <div class="sku-block-content-title">
          <a class="product-list-item-link" href="/site/lg-65-oled/6535940.p?skuId=6535940">
            <h2 class="product-title">LG 65" Class C3 OLED 4K TV</h2>
          </a>
        </div>
        <div data-testid="customer-price"><span>$1,299.99</span></div>
        <div data-testid="regular-price">Was $2,099.99</div>
      </li>
      <li class="product-list-item product-list-item-gridView">
        <h2 class="product-title">Sold out soundbar</h2>
        <a class="product-list-item-link" href="/site/soundbar/1.p">x</a>
        <div data-testid="customer-price">$199.99</div>
        <button>Sold Out</button>
      </li>
      <li class="product-list-item product-list-item-gridView">
        <h2 class="product-title">Open-box MacBook Air</h2>
        <div data-testid="customer-price">$999.99</div>
      </li>
      <li class="product-list-item product-list-item-gridView">
        <h2 class="product-title">Price in cart</h2>
        <a class="product-list-item-link" href="/site/cart/2.p">x</a>
      </li>
    </ol></body></html>
    "#;

    const PAGE_URL: &str = "https://www.bestbuy.com/site/searchpage.jsp?st=oled";

    #[test]
    fn test_markup_extraction() {
        let extraction = BestBuy.extract(SEARCH_PAGE, PAGE_URL, 5);
        assert_eq!(extraction.deals.len(), 3);
        assert_eq!(extraction.skipped, 1);

        let tv = &extraction.deals[0];
        assert_eq!(tv.retailer(), "Best Buy");
        assert_eq!(tv.price(), 1299.99);
        assert_eq!(tv.original_price(), 2099.99);
        assert_eq!(tv.discount_percentage(), 38);
        assert_eq!(tv.quality(), DealQuality::Excellent);
        assert_eq!(
            tv.url(),
            "https://www.bestbuy.com/site/lg-65-oled/6535940.p?skuId=6535940"
        );
        assert_eq!(tv.availability(), Availability::InStock);

        assert_eq!(extraction.deals[1].availability(), Availability::OutOfStock);
    }

    #[test]
    fn test_unlinked_listing_points_at_search_page() {
        let extraction = BestBuy.extract(SEARCH_PAGE, PAGE_URL, 5);
        let laptop = &extraction.deals[2];
        assert_eq!(laptop.title(), Some("Open-box MacBook Air"));
        assert_eq!(laptop.price(), 999.99);
        assert_eq!(laptop.url(), PAGE_URL);
    }

    #[test]
    fn test_empty_page() {
        assert!(BestBuy.extract("<html></html>", PAGE_URL, 5).is_empty());
    }
}

use super::{absolute_url, element_text, selector};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static COUNCIL_LINKS: Lazy<Selector> = Lazy::new(|| selector("ul.scrollat-600 li a"));
static CATEGORY_WRAPPER: Lazy<Selector> = Lazy::new(|| selector("div.category-expand-wrapper"));
static CATEGORY_LINK: Lazy<Selector> = Lazy::new(|| selector("a.category-expand"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouncilLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLinks {
    pub name: String,
    pub url: String,
    /// (subcategory name, absolute URL)
    pub subcategories: Vec<(String, String)>,
}

/// Councils listed on a state landing page.
pub fn parse_state_councils(html: &str, base_url: &str) -> Vec<CouncilLink> {
    let document = Html::parse_document(html);
    document
        .select(&COUNCIL_LINKS)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let name = element_text(&a);
            if name.is_empty() {
                debug!("Skipping council link without a name: {}", href);
                return None;
            }
            Some(CouncilLink {
                name,
                url: absolute_url(base_url, href),
            })
        })
        .collect()
}

/// Categories on a council page together with the subcategory links listed under each.
///
/// Each `div.category-expand-wrapper` is followed by its own `ul.link-list`;
/// in-page injection anchors and unnamed links are dropped.
pub fn parse_council_categories(html: &str, base_url: &str) -> Vec<CategoryLinks> {
    let document = Html::parse_document(html);
    let mut categories = Vec::new();

    for wrapper in document.select(&CATEGORY_WRAPPER) {
        let Some(link) = wrapper.select(&CATEGORY_LINK).next() else {
            debug!("Category wrapper without a category link");
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let subcategories = following_link_list(wrapper)
            .map(|ul| {
                ul.select(&ANCHOR)
                    .filter_map(|a| {
                        let href = a.value().attr("href")?;
                        let name = element_text(&a);
                        if href.contains("#dp-inject") || name.is_empty() {
                            debug!("Skipping invalid subcategory link: {}", href);
                            return None;
                        }
                        Some((name, absolute_url(base_url, href)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        categories.push(CategoryLinks {
            name: element_text(&link),
            url: absolute_url(base_url, href),
            subcategories,
        });
    }

    categories
}

fn following_link_list(wrapper: ElementRef) -> Option<ElementRef> {
    for sibling in wrapper.next_siblings() {
        let Some(el) = ElementRef::wrap(sibling) else {
            continue;
        };
        let value = el.value();
        if value.name() == "ul" && value.classes().any(|c| c == "link-list") {
            return Some(el);
        }
        if value.classes().any(|c| c == "category-expand-wrapper") {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.mycommunitydirectory.com.au";

    #[test]
    fn test_parse_state_councils() {
        let html = r#"
            <ul class="scrollat-600">
              <li><a href="/Victoria/Banyule">Banyule Council</a></li>
              <li><a href="/Victoria/Bayside"> Bayside  Council </a></li>
              <li><a>No link</a></li>
            </ul>
        "#;
        let councils = parse_state_councils(html, BASE);
        assert_eq!(councils.len(), 2);
        assert_eq!(councils[0].name, "Banyule Council");
        assert_eq!(councils[0].url, "https://www.mycommunitydirectory.com.au/Victoria/Banyule");
        assert_eq!(councils[1].name, "Bayside Council");
    }

    #[test]
    fn test_parse_council_categories() {
        let html = r##"
            <div class="categories">
              <div class="category-expand-wrapper"><a class="category-expand" href="/Victoria/Banyule/Health">Health</a></div>
              <ul class="link-list">
                <li><a href="/Victoria/Banyule/Health/Dental">Dental</a></li>
                <li><a href="#dp-inject">Advertise</a></li>
                <li><a href="/Victoria/Banyule/Health/Blank"> </a></li>
              </ul>
              <div class="category-expand-wrapper"><a class="category-expand" href="/Victoria/Banyule/Sport">Sport</a></div>
              <div class="category-expand-wrapper"><a class="category-expand" href="/Victoria/Banyule/Food">Food</a></div>
              <ul class="link-list"><li><a href="/Victoria/Banyule/Food/Relief">Food Relief</a></li></ul>
            </div>
        "##;
        let cats = parse_council_categories(html, BASE);
        assert_eq!(cats.len(), 3);
        assert_eq!(cats[0].name, "Health");
        assert_eq!(
            cats[0].subcategories,
            vec![(
                "Dental".to_string(),
                "https://www.mycommunitydirectory.com.au/Victoria/Banyule/Health/Dental".to_string()
            )]
        );
        assert!(cats[1].subcategories.is_empty());
        assert_eq!(cats[2].subcategories.len(), 1);
        assert_eq!(cats[2].subcategories[0].0, "Food Relief");
    }
}

use scraper::{Html, Selector};
use url::Url;

/// A URL in the canonical form used for frontier deduplication and index
/// locations: fragment stripped, query kept.
pub fn canonical(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Extracts the http(s) links from the anchor tags in the HTML, resolved
/// absolute against the page's own URL, fragment-stripped, in document
/// order. Malformed hrefs are dropped silently.
pub fn links(base: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("valid selector");
    let mut found = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Ok(mut link) = base.join(href) {
            if link.scheme().starts_with("http") {
                link.set_fragment(None);
                found.push(link);
            }
        }
    }
    found
}

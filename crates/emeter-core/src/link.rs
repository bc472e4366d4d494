//! Results page lookup: find the team's "E-Meter Data" link.

use crate::error::FetchError;
use crate::http::HttpSession;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Results page for one car, e.g. `https://results.fsaeonline.com/MyResults.aspx?carnum=201&tab=notices`.
pub fn results_page_url(results_base: &str, car: u32, tab: &str) -> String {
    format!(
        "{}/MyResults.aspx?carnum={}&tab={}",
        results_base.trim_end_matches('/'),
        car,
        tab
    )
}

/// True for anchor text like "E-Meter Data" or "emeter data" (case-insensitive).
pub fn is_emeter_label(text: &str) -> bool {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    normalized.contains("e-meter data") || normalized.contains("emeter data")
}

/// Returns the `href` of the first anchor whose text is an E-Meter label.
///
/// `None` when no anchor matches or the matching anchor has no `href`.
pub fn find_emeter_link(html: &str) -> Option<String> {
    let Ok(anchors) = Selector::parse("a") else {
        return None;
    };
    let doc = Html::parse_document(html);
    let anchor = doc
        .select(&anchors)
        .find(|a| is_emeter_label(&a.text().collect::<String>()))?;
    anchor
        .value()
        .attr("href")
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// Resolves `href` against the page it was found on; absolute hrefs pass through.
pub fn resolve_href(page_url: &str, href: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Fetches the results page for `car` and returns the absolute E-Meter link, if any.
pub fn fetch_team_link(
    session: &mut HttpSession,
    results_base: &str,
    tab: &str,
    car: u32,
    timeout: Duration,
) -> Result<Option<String>, FetchError> {
    let page_url = results_page_url(results_base, car, tab);
    let html = session.get_text(&page_url, &[], timeout)?;
    let link = find_emeter_link(&html).map(|href| resolve_href(&page_url, &href));
    match &link {
        Some(l) => tracing::debug!(car, link = %l, "found e-meter link"),
        None => tracing::debug!(car, "no e-meter link on results page"),
    }
    Ok(link)
}

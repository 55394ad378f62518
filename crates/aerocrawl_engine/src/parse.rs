use std::collections::HashSet;
use std::sync::LazyLock;

use aerocrawl_core::{expand_page_refs, Category, DetailFields, PageRef, RecordStub};
use crawl_logging::{crawl_debug, crawl_warn};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Index anchors label categories as `NAME(SUBNAME)`; the inner name is what
/// the configuration refers to.
static CATEGORY_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+\((.{2,})\)").expect("category label pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("detail page is missing the contact field")]
    MissingContact,
}

fn selector(css: &str) -> Selector {
    // All selectors in this module are fixed strings.
    Selector::parse(css).expect("static selector")
}

/// Resolves the configured category names against the site index.
///
/// Keeps site order. Configured names that match no index anchor are dropped
/// with a warning; they produce no records and no error.
pub fn resolve_categories(html: &str, base_url: &str, configured: &[String]) -> Vec<Category> {
    let doc = Html::parse_document(html);
    let anchor_sel = selector("div.mod-body a");
    let base = Url::parse(base_url).ok();

    let wanted: HashSet<&str> = configured.iter().map(String::as_str).collect();
    let mut categories = Vec::new();

    for anchor in doc.select(&anchor_sel) {
        let Some(label) = anchor.value().attr("title") else {
            continue;
        };
        let Some(captures) = CATEGORY_LABEL.captures(label) else {
            continue;
        };
        let name = &captures[1];
        if !wanted.contains(name) {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        match resolve_href(href, base.as_ref()) {
            Some(entry_url) => categories.push(Category {
                name: name.to_string(),
                entry_url,
            }),
            None => crawl_warn!("category '{name}' has an unresolvable href '{href}'"),
        }
    }

    let matched: HashSet<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    for name in configured {
        if !matched.contains(name.as_str()) {
            crawl_warn!("configured category '{name}' matched nothing on the index page");
        }
    }

    categories
}

/// Locates the pagination control on a listing page and expands it into the
/// full page run. Any failure to find or parse the control degrades to a
/// single page at `current_url`.
pub fn discover_page_refs(html: &str, current_url: &str) -> Vec<PageRef> {
    let doc = Html::parse_document(html);
    let control_sel = selector("ul.pagination");
    let link_sel = selector("li a");
    let base = Url::parse(current_url).ok();

    let hrefs: Vec<String> = doc
        .select(&control_sel)
        .next()
        .map(|control| {
            control
                .select(&link_sel)
                .filter_map(|a| a.value().attr("href"))
                .filter_map(|href| resolve_href(href, base.as_ref()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    expand_page_refs(&hrefs, current_url)
}

/// Scans the listing table of one page into record stubs.
///
/// Returns the stubs plus the count of rows skipped because extraction
/// failed; a bad row never aborts the page.
pub fn scan_listing(html: &str, page_url: &str, category: &str) -> (Vec<RecordStub>, u64) {
    let doc = Html::parse_document(html);
    let row_sel = selector("table tbody tr");
    let base = Url::parse(page_url).ok();

    let mut stubs = Vec::new();
    let mut skipped = 0u64;
    for row in doc.select(&row_sel) {
        match scan_row(row, base.as_ref(), category) {
            Some(stub) => stubs.push(stub),
            None => {
                skipped += 1;
                crawl_warn!("skipping unparsable listing row on {page_url}");
            }
        }
    }
    (stubs, skipped)
}

fn scan_row(row: ElementRef<'_>, base: Option<&Url>, category: &str) -> Option<RecordStub> {
    let cell_sel = selector("td");
    let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
    if cells.len() < 4 {
        return None;
    }

    let subregion = name_cell_text(cells[0])?;
    let name = name_cell_text(cells[1])?;

    let anchor_sel = selector("a");
    let href = cells[1]
        .select(&anchor_sel)
        .find_map(|a| a.value().attr("href"))?;
    let detail_url = resolve_href(href, base)?;

    let short_code = cells[2]
        .select(&anchor_sel)
        .next()
        .map(|a| collect_text(a))
        .filter(|text| !text.is_empty())?;

    let span_sel = selector("span");
    let long_code = cells[3]
        .select(&span_sel)
        .find_map(|span| span.value().attr("title"))
        .and_then(|title| last_colon_segment(title))?;

    Some(RecordStub {
        category: category.to_string(),
        subregion,
        name,
        detail_url,
        short_code,
        long_code,
    })
}

/// Name cells come in two markup shapes: a plain anchor, or an anchor whose
/// text sits inside a decorating `font` element. Both are attempted, first
/// success wins.
fn name_cell_text(cell: ElementRef<'_>) -> Option<String> {
    let anchor_sel = selector("a");
    let anchor = cell.select(&anchor_sel).next()?;

    if let Some(text) = last_line(&direct_text(anchor)) {
        return Some(text);
    }

    let font_sel = selector("font");
    anchor
        .select(&font_sel)
        .next()
        .and_then(|font| last_line(&collect_text(font)))
}

/// Extracts the contact phone (required) and description (optional) from a
/// detail page.
pub fn parse_detail(html: &str) -> Result<DetailFields, ParseError> {
    let doc = Html::parse_document(html);
    let info_sel = selector("ul.info-detail li");
    let desc_sel = selector("div.airport-des-c p");

    let contact_phone = doc
        .select(&info_sel)
        .nth(4)
        .map(|item| collect_text(item))
        .and_then(|text| last_colon_segment(&text))
        .ok_or(ParseError::MissingContact)?;

    // Absence of a description is a valid state, not an error.
    let description = doc
        .select(&desc_sel)
        .next()
        .map(|p| collect_text(p))
        .unwrap_or_default();
    if description.is_empty() {
        crawl_debug!("detail page has no description block");
    }

    Ok(DetailFields {
        contact_phone,
        description,
    })
}

fn resolve_href(href: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}

/// Whitespace-normalized text of all descendant text nodes.
fn collect_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text nodes that are immediate children of the element, skipping any
/// nested markup.
fn direct_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn last_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .map(String::from)
}

/// The value after the last ASCII or fullwidth colon, trimmed.
fn last_colon_segment(text: &str) -> Option<String> {
    let value = text
        .rsplit([':', '\u{ff1a}'])
        .next()
        .map(str::trim)
        .unwrap_or_default();
    (!value.is_empty()).then(|| value.to_string())
}

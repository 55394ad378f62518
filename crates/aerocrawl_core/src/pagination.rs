use crate::PageRef;

/// URL segment that carries the page ordinal, e.g. `...__page-3`.
pub const PAGE_SEGMENT: &str = "__page-";

/// Extracts the page ordinal encoded in a listing URL, if any.
///
/// The ordinal is the run of digits immediately after [`PAGE_SEGMENT`];
/// trailing path or query characters are ignored. Zero is not a valid
/// ordinal.
pub fn page_ordinal(href: &str) -> Option<u32> {
    let (_, tail) = href.split_once(PAGE_SEGMENT)?;
    let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
    let ordinal = digits.parse::<u32>().ok()?;
    (ordinal >= 1).then_some(ordinal)
}

/// Expands a set of pagination-link URLs into the full contiguous page run.
///
/// The maximum ordinal found across `hrefs` determines the run `1..=max`;
/// each page URL is synthesized by substituting the ordinal into the template
/// taken from the last href that carries one. When no href carries an ordinal
/// the listing degenerates to a single page at `fallback_url`. This fallback
/// is deliberate: a listing without pagination controls is a valid one-page
/// category and must not abort the traversal.
pub fn expand_page_refs(hrefs: &[String], fallback_url: &str) -> Vec<PageRef> {
    let numbered: Vec<(&String, u32)> = hrefs
        .iter()
        .filter_map(|href| page_ordinal(href).map(|ordinal| (href, ordinal)))
        .collect();

    let Some(max) = numbered.iter().map(|(_, ordinal)| *ordinal).max() else {
        return vec![PageRef {
            ordinal: 1,
            url: fallback_url.to_string(),
        }];
    };

    // The template prefix comes from the last numbered link, matching the
    // convention that all page links share one URL shape.
    let (template, _) = numbered[numbered.len() - 1];
    let prefix = match template.split_once(PAGE_SEGMENT) {
        Some((prefix, _)) => prefix,
        None => {
            return vec![PageRef {
                ordinal: 1,
                url: fallback_url.to_string(),
            }];
        }
    };

    (1..=max)
        .map(|ordinal| PageRef {
            ordinal,
            url: format!("{prefix}{PAGE_SEGMENT}{ordinal}"),
        })
        .collect()
}

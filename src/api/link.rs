// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Parsing of the `Link` response header used for cursor pagination.
//!
//! Sentry advertises pages as
//! `<url>; rel="next"; results="true"; cursor="100:1:0"`. A `next` entry with
//! `results="false"` marks the last page.

use std::sync::LazyLock;

use regex::Regex;

static LINK_ENTRY: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r#"<([^>]*)>((?:\s*;\s*[A-Za-z_-]+\s*=\s*"[^"]*")*)"#,)
        .expect("valid link entry pattern",)
},);

static LINK_PARAM: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_-]+)\s*=\s*"([^"]*)""#,).expect("valid link parameter pattern",)
},);

/// Single entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq, Default,)]
pub struct LinkEntry
{
    /// Target URL.
    pub url:     String,
    /// Relation such as `next` or `previous`.
    pub rel:     Option<String,>,
    /// Sentry's `results` hint; `Some(false)` when the page is empty.
    pub results: Option<bool,>,
    /// Opaque cursor for the page.
    pub cursor:  Option<String,>,
}

/// Parses every entry of a `Link` header, in header order.
pub fn parse_link_header(header: &str,) -> Vec<LinkEntry,>
{
    LINK_ENTRY
        .captures_iter(header,)
        .map(|captures| {
            let mut entry = LinkEntry {
                url: captures[1].trim().to_owned(), ..LinkEntry::default()
            };
            let params = captures.get(2,).map_or("", |params| params.as_str(),);
            for param in LINK_PARAM.captures_iter(params,) {
                let value = param[2].to_owned();
                match param[1].to_ascii_lowercase().as_str() {
                    "rel" => entry.rel = Some(value,),
                    "results" => entry.results = Some(value.eq_ignore_ascii_case("true",),),
                    "cursor" => entry.cursor = Some(value,),
                    _ => {}
                }
            }
            entry
        },)
        .collect()
}

/// Returns the cursor of the next page, or `None` when the header signals
/// that no further pages exist.
///
/// Falls back to the `cursor` query parameter of the next URL for servers
/// that omit the `cursor` attribute.
pub fn next_cursor(header: Option<&str,>,) -> Option<String,>
{
    let entries = parse_link_header(header?,);
    let next = entries.into_iter().find(|entry| entry.rel.as_deref() == Some("next"),)?;

    if next.results == Some(false,) {
        return None;
    }

    next.cursor.or_else(|| cursor_from_url(&next.url,),)
}

fn cursor_from_url(url: &str,) -> Option<String,>
{
    let (_, query,) = url.split_once('?',)?;
    query
        .split('&',)
        .filter_map(|pair| pair.split_once('=',),)
        .find(|(key, _,)| *key == "cursor",)
        .map(|(_, value,)| value.to_owned(),)
        .filter(|value| !value.is_empty(),)
}

#[cfg(test)]
mod tests
{
    use super::*;

    const SENTRY_HEADER: &str = "<https://sentry.io/api/0/organizations/acme/projects/?&cursor=100:-1:1>; \
         rel=\"previous\"; results=\"false\"; cursor=\"100:-1:1\", \
         <https://sentry.io/api/0/organizations/acme/projects/?&cursor=100:1:0>; \
         rel=\"next\"; results=\"true\"; cursor=\"100:1:0\"";

    #[test]
    fn parses_previous_and_next_entries()
    {
        let entries = parse_link_header(SENTRY_HEADER,);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rel.as_deref(), Some("previous"));
        assert_eq!(entries[0].results, Some(false));
        assert_eq!(entries[1].cursor.as_deref(), Some("100:1:0"));
        assert!(entries[1].url.ends_with("cursor=100:1:0"));
    }

    #[test]
    fn next_cursor_follows_results_hint()
    {
        assert_eq!(next_cursor(Some(SENTRY_HEADER,),).as_deref(), Some("100:1:0"));

        let last = SENTRY_HEADER.replace("results=\"true\"", "results=\"false\"",);
        assert_eq!(next_cursor(Some(&last,),), None);
    }

    #[test]
    fn next_cursor_is_none_without_header_or_next_entry()
    {
        assert_eq!(next_cursor(None,), None);
        assert_eq!(next_cursor(Some("<https://example.com/?cursor=1>; rel=\"previous\"",),), None);
        assert_eq!(next_cursor(Some("",),), None);
    }

    #[test]
    fn next_cursor_falls_back_to_url_query()
    {
        let header = "<https://example.com/api/0/teams/?per_page=100&cursor=abc>; rel=\"next\"";
        assert_eq!(next_cursor(Some(header,),).as_deref(), Some("abc"));
    }
}

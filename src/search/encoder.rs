//! Query Encoder
//!
//! Turns a [`SearchQuery`] into the parameters of `GET /search`.
//!
//! The backend evaluates `categories`, `journals`, `pubyears` and `deep` as
//! Python literals, so values are written in that syntax:
//!
//! | field       | example                     |
//! |-------------|-----------------------------|
//! | lists       | `["medicine","immunology"]` |
//! | year range  | `[2018,2020]`               |
//! | open range  | `[2019,None]`               |
//! | booleans    | `True` / `False`            |
//!
//! List items are double-quoted; `\` and `"` inside an item are escaped with
//! a backslash. [`parse_string_list`] reads the same convention back.

use crate::models::{SearchQuery, YearFilter};
use std::fmt;

/// Literal for "no upper bound" in a year range
const NO_BOUND: &str = "None";

/// Ordered `(key, value)` pairs ready to be sent as a query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedQuery {
    pairs: Vec<(&'static str, String)>,
}

impl EncodedQuery {
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|(k, _)| *k).collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Percent-encoded `key=value&...` string without the leading `?`
    pub fn to_query_string(&self) -> String {
        let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
            return String::new();
        };
        self.apply_to(&mut url);
        url.query().unwrap_or_default().to_string()
    }

    /// Append the pairs to `url`'s query, percent-encoding them
    pub fn apply_to(&self, url: &mut reqwest::Url) {
        url.query_pairs_mut()
            .extend_pairs(self.pairs.iter().map(|(k, v)| (*k, v.as_str())));
    }

    fn push(&mut self, key: &'static str, value: String) {
        self.pairs.push((key, value));
    }
}

impl fmt::Display for EncodedQuery {
    /// Unencoded form, for logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

/// Encode a query. Empty or unset fields are left out; `type` and `deep`
/// are always present.
pub fn encode(query: &SearchQuery) -> EncodedQuery {
    let mut out = EncodedQuery::default();

    if let Some(term) = query.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        out.push("query", term.to_string());
    }
    if !query.categories.is_empty() {
        out.push("categories", encode_string_list(&query.categories));
    }
    if !query.journals.is_empty() {
        out.push("journals", encode_string_list(&query.journals));
    }
    if let Some(years) = &query.pubyears {
        out.push("pubyears", encode_year_filter(years));
    }
    out.push("type", query.kind.as_str().to_string());
    out.push("deep", encode_bool(query.deep).to_string());

    out
}

pub fn encode_string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| quote(item)).collect();
    format!("[{}]", quoted.join(","))
}

pub fn encode_year_filter(years: &YearFilter) -> String {
    match years.end {
        Some(end) => format!("[{},{}]", years.start, end),
        None => format!("[{},{}]", years.start, NO_BOUND),
    }
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn quote(item: &str) -> String {
    let mut out = String::with_capacity(item.len() + 2);
    out.push('"');
    for c in item.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parse a list written by [`encode_string_list`]
pub fn parse_string_list(input: &str) -> Option<Vec<String>> {
    let inner = input.trim().strip_prefix('[')?.strip_suffix(']')?;
    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            // Only an empty list may end here; otherwise a `,` promised another item
            None if items.is_empty() => break,
            None => return None,
            Some('"') => {}
            Some(_) => return None,
        }

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                '"' => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }

    Some(items)
}

/// Parse a range written by [`encode_year_filter`]
pub fn parse_year_filter(input: &str) -> Option<YearFilter> {
    let inner = input.trim().strip_prefix('[')?.strip_suffix(']')?;
    let (start, end) = inner.split_once(',')?;
    let start = start.trim().parse().ok()?;
    let end = match end.trim() {
        NO_BOUND => None,
        year => Some(year.parse().ok()?),
    };
    Some(YearFilter { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryKind;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_query_has_only_type_and_deep() {
        let encoded = encode(&SearchQuery::default());
        assert_eq!(encoded.keys(), vec!["type", "deep"]);
        assert_eq!(encoded.get("type"), Some("new"));
        assert_eq!(encoded.get("deep"), Some("False"));
    }

    #[test]
    fn test_blank_term_is_omitted() {
        let encoded = encode(&SearchQuery::term("   "));
        assert_eq!(encoded.keys(), vec!["type", "deep"]);
    }

    #[test]
    fn test_full_query_field_order() {
        let query = SearchQuery {
            query: Some("covid vaccine".to_string()),
            categories: strings(&["medicine", "immunology"]),
            journals: strings(&["Nature"]),
            pubyears: Some(YearFilter::between(2018, 2020)),
            deep: true,
            kind: QueryKind::FollowUp,
        };
        let encoded = encode(&query);
        assert_eq!(
            encoded.to_string(),
            "query=covid vaccine&categories=[\"medicine\",\"immunology\"]&journals=[\"Nature\"]\
             &pubyears=[2018,2020]&type=follow-up&deep=True"
        );
    }

    #[test]
    fn test_year_encoding() {
        assert_eq!(encode_year_filter(&YearFilter::between(2018, 2020)), "[2018,2020]");
        assert_eq!(encode_year_filter(&YearFilter::from_year(2019)), "[2019,None]");
        assert_eq!(parse_year_filter("[2019,None]"), Some(YearFilter::from_year(2019)));
        assert_eq!(parse_year_filter("[2018, 2020]"), Some(YearFilter::between(2018, 2020)));
        assert_eq!(parse_year_filter("2018"), None);
    }

    #[test]
    fn test_list_round_trip() {
        let cases = [
            strings(&["medicine"]),
            strings(&["a", "b", "c"]),
            strings(&["New England Journal of Medicine", "Cell, Reports"]),
            strings(&["quote \" inside", "back\\slash", ""]),
            strings(&["日本医学", "[brackets]"]),
        ];
        for items in cases {
            let encoded = encode_string_list(&items);
            assert_eq!(parse_string_list(&encoded), Some(items));
        }
    }

    #[test]
    fn test_parse_rejects_malformed_lists() {
        assert_eq!(parse_string_list("[\"a\""), None);
        assert_eq!(parse_string_list("\"a\""), None);
        assert_eq!(parse_string_list("[a]"), None);
        assert_eq!(parse_string_list("[\"a\" \"b\"]"), None);
        assert_eq!(parse_string_list("[\"a\",]"), None);
        assert_eq!(parse_string_list("[\"a\", ]"), None);
        assert_eq!(parse_string_list("[,]"), None);
        assert_eq!(parse_string_list("[]"), Some(vec![]));
    }

    #[test]
    fn test_query_string_is_percent_encoded() {
        let encoded = encode(&SearchQuery::term("heart & lung"));
        let qs = encoded.to_query_string();
        assert!(qs.starts_with("query=heart+%26+lung&"));
        assert!(qs.ends_with("type=new&deep=False"));
    }
}

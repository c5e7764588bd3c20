//! Listing request inputs
//!
//! Query-string parameters, navigation links that preserve them, and the
//! block configuration that selects the listing mode.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::predicate::DateRange;

/// The `year` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearParam {
    Selected(i32),
    /// Present but not a number: matches nothing
    Malformed,
}

/// Parameters of a listing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Raw search input; `Some("")` when the parameter is present but empty
    pub q: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub year: Option<YearParam>,
    /// 1-based page, never 0
    pub page: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            q: None,
            from_date: None,
            to_date: None,
            year: None,
            page: 1,
        }
    }
}

impl QueryParams {
    /// Parse a query string (a leading `?` is ignored)
    ///
    /// The first occurrence of a repeated parameter wins. Never fails: an
    /// unusable `page` falls back to 1.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        let mut page_seen = false;

        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*name {
                "q" if params.q.is_none() => params.q = Some(value.into_owned()),
                "from_date" if params.from_date.is_none() => {
                    params.from_date = Some(value.into_owned())
                }
                "to_date" if params.to_date.is_none() => params.to_date = Some(value.into_owned()),
                "year" if params.year.is_none() && !value.is_empty() => {
                    params.year = Some(
                        match leading_int(&value).and_then(|year| i32::try_from(year).ok()) {
                            Some(year) => YearParam::Selected(year),
                            None => YearParam::Malformed,
                        },
                    )
                }
                "page" if !page_seen => {
                    page_seen = true;
                    params.page = leading_int(&value)
                        .and_then(|page| usize::try_from(page).ok())
                        .filter(|page| *page >= 1)
                        .unwrap_or(1);
                }
                _ => {}
            }
        }
        params
    }

    /// Date criterion; active only when both bounds are present
    pub fn date_range(&self) -> DateRange {
        DateRange::parse(self.from_date.as_deref(), self.to_date.as_deref())
    }

    /// Serialize back to a query string, omitting absent parameters
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(q) = &self.q {
            out.append_pair("q", q);
        }
        if let Some(from) = &self.from_date {
            out.append_pair("from_date", from);
        }
        if let Some(to) = &self.to_date {
            out.append_pair("to_date", to);
        }
        if let Some(YearParam::Selected(year)) = self.year {
            out.append_pair("year", &year.to_string());
        }
        if self.page > 1 {
            out.append_pair("page", &self.page.to_string());
        }
        out.finish()
    }
}

/// Leading decimal integer of `s`; trailing text is ignored
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Same-path link with `name` set to `value`
///
/// Other parameters keep their order. An empty `value` removes `name`.
/// Setting replaces the first occurrence in place and drops any repeats.
pub fn link_with_param(path: &str, query: &str, name: &str, value: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut replaced = false;
    let mut out = form_urlencoded::Serializer::new(String::new());

    for (key, current) in form_urlencoded::parse(query.as_bytes()) {
        if key != name {
            out.append_pair(&key, &current);
        } else if !value.is_empty() && !replaced {
            out.append_pair(name, value);
            replaced = true;
        }
    }
    if !value.is_empty() && !replaced {
        out.append_pair(name, value);
    }

    format!("{}?{}", path, out.finish())
}

/// Which listing a block renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingMode {
    /// Free-text search over title and long description
    Search,
    /// Articles tagged `value` in field `key`
    Category { key: String, value: String },
    /// Every article, newest first
    Plain,
}

/// First key/value of a listing block's configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub key: Option<String>,
    pub value: Option<String>,
}

impl BlockConfig {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(to_config_key(&key.into())),
            value: Some(value.into().trim().to_string()),
        }
    }

    pub fn search() -> Self {
        Self::new("query", "")
    }

    /// Parse `key=value` (a bare key has an empty value; blank input is an
    /// empty configuration)
    pub fn parse(s: &str) -> Self {
        if s.trim().is_empty() {
            return Self::default();
        }
        match s.split_once('=') {
            Some((key, value)) => Self::new(key, value),
            None => Self::new(s, ""),
        }
    }

    pub fn mode(&self) -> ListingMode {
        match (self.key.as_deref(), self.value.as_deref()) {
            (Some("query"), _) => ListingMode::Search,
            (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
                ListingMode::Category {
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            _ => ListingMode::Plain,
        }
    }
}

/// Block keys are written as free text ("Category") and read as lowercase
/// dash-separated names ("category")
fn to_config_key(raw: &str) -> String {
    raw.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

//! Mirroring filter state into URL query parameters.

use url::Url;

use super::ColumnFilter;
use super::FilterCondition;
use super::FilterState;

/// Query parameter holding the global search term.
pub const SEARCH_PARAM: &str = "search";

/// Prefix of query parameters holding applied column filters.
pub const FILTER_PARAM_PREFIX: &str = "filter_";

/// Writes applied filters and the search term into a URL's query string.
///
/// `search` carries the global search; each applied filter is written to
/// `filter_<columnId>`, text values verbatim and other values as JSON.
/// Parameters for cleared filters are removed and unrelated parameters are
/// preserved in order.
///
/// # Example
///
/// ```ignore
/// let mut url = Url::parse("https://app.example/users?tab=all")?;
/// let state = FilterState::new().with_search("bob");
/// UrlFilterSync::new().sync(&mut url, &state);
/// assert_eq!(url.query(), Some("tab=all&search=bob"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct UrlFilterSync {
    enabled: bool,
}

impl UrlFilterSync {
    /// Creates an enabled sync.
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Creates a sync that leaves URLs untouched.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Returns `true` if syncing is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Rewrites the query of `url` from `state`. Returns `true` if it changed.
    pub fn sync(&self, url: &mut Url, state: &FilterState) -> bool {
        if !self.enabled {
            return false;
        }

        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != SEARCH_PARAM && !key.starts_with(FILTER_PARAM_PREFIX))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        if !state.global_search.is_empty() {
            pairs.push((SEARCH_PARAM.to_string(), state.global_search.clone()));
        }
        for (column_id, filter) in &state.applied_filters {
            pairs.push((format!("{}{}", FILTER_PARAM_PREFIX, column_id), param_value(filter)));
        }

        let before = url.query().map(str::to_string);
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        log::trace!("Synced filters into URL: {}", url);
        before.as_deref() != url.query()
    }
}

impl Default for UrlFilterSync {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a filter's value for its query parameter.
pub fn param_value(filter: &ColumnFilter) -> String {
    match &filter.condition {
        FilterCondition::Equals(s)
        | FilterCondition::Contains(s)
        | FilterCondition::StartsWith(s)
        | FilterCondition::EndsWith(s) => s.clone(),
        other => other.value_json().to_string(),
    }
}

// Core models: the query sent to the backend, the JSON it answers with,
// and the view models the UI renders.

use std::fmt;

/// Maximum number of characters of an abstract shown in a result card
pub const ABSTRACT_CHAR_LIMIT: usize = 300;

/// Text shown when a paper has no abstract
pub const NO_PREVIEW: &str = "No preview available";

/// Topics the search service classifies papers into
pub const KNOWN_TOPICS: &[&str] = &["medicine", "botany", "immunology"];

/// Whether a query starts a new search or refines the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum QueryKind {
    #[default]
    #[serde(rename = "new")]
    New,
    #[serde(rename = "follow-up")]
    FollowUp,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::New => "new",
            QueryKind::FollowUp => "follow-up",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication year filter. `end: None` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct YearFilter {
    pub start: u16,
    pub end: Option<u16>,
}

impl YearFilter {
    /// Filter from `year` onwards
    pub fn from_year(year: u16) -> Self {
        Self { start: year, end: None }
    }

    pub fn between(start: u16, end: u16) -> Self {
        Self { start, end: Some(end) }
    }

    /// Smallest closed range covering every year in `years`
    pub fn spanning(years: &[u16]) -> Option<Self> {
        let start = years.iter().copied().min()?;
        let end = years.iter().copied().max()?;
        Some(Self::between(start, end))
    }

    pub fn contains(&self, year: u16) -> bool {
        year >= self.start && self.end.map_or(true, |end| year <= end)
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

/// The single source of truth for what the user is searching for
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub journals: Vec<String>,
    pub pubyears: Option<YearFilter>,
    #[serde(default)]
    pub deep: bool,
    #[serde(rename = "type", default)]
    pub kind: QueryKind,
}

impl SearchQuery {
    /// Query with only a search term set
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            query: Some(term.into()),
            ..Default::default()
        }
    }

    /// True when no search term and no filters are set
    pub fn is_blank(&self) -> bool {
        self.query.as_deref().map_or(true, |q| q.trim().is_empty())
            && self.categories.is_empty()
            && self.journals.is_empty()
            && self.pubyears.is_none()
    }

    /// Merge a partial update into this query
    pub fn apply(&mut self, patch: QueryPatch) {
        if let Some(query) = patch.query {
            self.query = query;
        }
        if let Some(categories) = patch.categories {
            self.categories = categories;
        }
        if let Some(journals) = patch.journals {
            self.journals = journals;
        }
        if let Some(pubyears) = patch.pubyears {
            self.pubyears = pubyears;
        }
        if let Some(deep) = patch.deep {
            self.deep = deep;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
    }
}

/// Partial update of a [`SearchQuery`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
    pub query: Option<Option<String>>,
    pub categories: Option<Vec<String>>,
    pub journals: Option<Vec<String>>,
    pub pubyears: Option<Option<YearFilter>>,
    pub deep: Option<bool>,
    pub kind: Option<QueryKind>,
}

impl QueryPatch {
    /// Patch that overwrites every field with the values of `query`
    pub fn all(query: SearchQuery) -> Self {
        Self {
            query: Some(query.query),
            categories: Some(query.categories),
            journals: Some(query.journals),
            pubyears: Some(query.pubyears),
            deep: Some(query.deep),
            kind: Some(query.kind),
        }
    }

    pub fn kind(kind: QueryKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn categories(categories: Vec<String>) -> Self {
        Self {
            categories: Some(categories),
            kind: Some(QueryKind::FollowUp),
            ..Default::default()
        }
    }

    pub fn journals(journals: Vec<String>) -> Self {
        Self {
            journals: Some(journals),
            kind: Some(QueryKind::FollowUp),
            ..Default::default()
        }
    }

    pub fn pubyears(pubyears: Option<YearFilter>) -> Self {
        Self {
            pubyears: Some(pubyears),
            kind: Some(QueryKind::FollowUp),
            ..Default::default()
        }
    }
}

// === Wire format ===

/// Body returned by `GET /search`
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ResultsJson {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub journals: Vec<String>,
    #[serde(default)]
    pub pubyears: Vec<u16>,
    pub results: Vec<PaperJson>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PaperJson {
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub doi_url: Option<String>,
    #[serde(default)]
    pub journal_name: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub z_authors: Option<Vec<AuthorJson>>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub is_oa: Option<bool>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AuthorJson {
    #[serde(default)]
    pub given: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub sequence: Option<String>,
}

// === View models ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
}

impl From<AuthorJson> for Author {
    fn from(json: AuthorJson) -> Self {
        let name = [json.given, json.family]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { name }
    }
}

/// A paper as shown in the results list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub title: String,
    pub abstract_text: String,
    pub authors: Option<Vec<Author>>,
    pub year: Option<u16>,
    pub journal: String,
    pub url: String,
    pub topic: String,
    pub doi: Option<String>,
}

impl Paper {
    /// Comma-separated author names, or `None` when the backend sent no authors
    pub fn author_line(&self) -> Option<String> {
        self.authors.as_ref().map(|authors| {
            authors
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

impl From<PaperJson> for Paper {
    fn from(json: PaperJson) -> Self {
        Self {
            title: json.title.unwrap_or_else(|| "Untitled".to_string()),
            abstract_text: truncate_abstract(json.abstract_text.as_deref()),
            authors: json
                .z_authors
                .map(|authors| authors.into_iter().map(Author::from).collect()),
            year: json.year,
            journal: json.journal_name.unwrap_or_default(),
            url: json.doi_url.unwrap_or_default(),
            topic: json.category.unwrap_or_default(),
            doi: json.doi,
        }
    }
}

/// Cut an abstract down to [`ABSTRACT_CHAR_LIMIT`] characters, appending `...`
pub fn truncate_abstract(text: Option<&str>) -> String {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return NO_PREVIEW.to_string(),
    };

    match text.char_indices().nth(ABSTRACT_CHAR_LIMIT) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Facet vocabularies observed in a result set. They double as the options
/// offered by the filter modals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub categories: Vec<String>,
    pub journals: Vec<String>,
    pub pubyears: Vec<u16>,
}

/// Decoded response of one search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub facets: Facets,
    pub papers: Vec<Paper>,
}

impl From<ResultsJson> for SearchResults {
    fn from(json: ResultsJson) -> Self {
        Self {
            facets: Facets {
                categories: json.categories,
                journals: json.journals,
                pubyears: json.pubyears,
            },
            papers: json.results.into_iter().map(Paper::from).collect(),
        }
    }
}

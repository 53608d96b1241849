//! Search form
//!
//! Raw text typed into the search page, and its validation into a
//! [`SearchQuery`]. Validation errors name the offending field so the UI can
//! show them in place; they never reach the query store.

use crate::models::{QueryKind, SearchQuery, YearFilter, KNOWN_TOPICS};
use thiserror::Error;

/// Fields of the search form, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Query,
    Categories,
    Journals,
    Pubyear,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Query,
        FormField::Categories,
        FormField::Journals,
        FormField::Pubyear,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Query => "Search",
            FormField::Categories => "Topics",
            FormField::Journals => "Journals",
            FormField::Pubyear => "Years",
        }
    }

    /// Only shown in advanced mode
    pub fn is_advanced(&self) -> bool {
        !matches!(self, FormField::Query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter a search term or at least one filter")]
    EmptyQuery,

    #[error("Invalid year {0:?}: use YYYY or YYYY-YYYY")]
    InvalidYear(String),

    #[error("Start year {start} is after end year {end}")]
    ReversedYears { start: u16, end: u16 },

    #[error("Unknown topic {0:?}")]
    UnknownCategory(String),
}

impl ValidationError {
    /// Field the error should be shown next to
    pub fn field(&self) -> FormField {
        match self {
            ValidationError::EmptyQuery => FormField::Query,
            ValidationError::InvalidYear(_) | ValidationError::ReversedYears { .. } => {
                FormField::Pubyear
            }
            ValidationError::UnknownCategory(_) => FormField::Categories,
        }
    }
}

/// What the user typed on the search page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub query: String,
    /// Comma-separated topics
    pub categories: String,
    /// Comma-separated journal names
    pub journals: String,
    pub pubyear: String,
    pub deep: bool,
    /// Advanced fields are ignored unless this is set
    pub advanced: bool,
}

impl SearchForm {
    /// Build a fresh query from the form. `extra_categories` are accepted in
    /// addition to [`KNOWN_TOPICS`].
    pub fn validate(&self, extra_categories: &[String]) -> Result<SearchQuery, ValidationError> {
        let query = Some(self.query.trim().to_string()).filter(|q| !q.is_empty());

        let (categories, journals, pubyears) = if self.advanced {
            (
                validate_categories(&self.categories, extra_categories)?,
                split_list(&self.journals),
                parse_year_input(&self.pubyear)?,
            )
        } else {
            (Vec::new(), Vec::new(), None)
        };

        let search = SearchQuery {
            query,
            categories,
            journals,
            pubyears,
            deep: self.deep,
            kind: QueryKind::New,
        };

        if search.is_blank() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(search)
    }
}

/// Split comma-separated input, dropping blanks and duplicates
pub fn split_list(input: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn validate_categories(input: &str, extra: &[String]) -> Result<Vec<String>, ValidationError> {
    split_list(input)
        .into_iter()
        .map(|item| {
            KNOWN_TOPICS
                .iter()
                .map(|t| t.to_string())
                .chain(extra.iter().cloned())
                .find(|known| known.eq_ignore_ascii_case(&item))
                .ok_or(ValidationError::UnknownCategory(item))
        })
        .collect()
}

/// Parse `YYYY` or `YYYY-YYYY` (spaces around the dash allowed).
/// A single year means "from that year on".
pub fn parse_year_input(input: &str) -> Result<Option<YearFilter>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid = || ValidationError::InvalidYear(trimmed.to_string());
    let parse_year = |s: &str| -> Result<u16, ValidationError> {
        let s = s.trim();
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    };

    match trimmed.split_once('-') {
        None => Ok(Some(YearFilter::from_year(parse_year(trimmed)?))),
        Some((start, end)) => {
            let start = parse_year(start)?;
            let end = parse_year(end)?;
            if start > end {
                return Err(ValidationError::ReversedYears { start, end });
            }
            Ok(Some(YearFilter::between(start, end)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advanced() -> SearchForm {
        SearchForm {
            query: "influenza".to_string(),
            advanced: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_year_inputs() {
        assert_eq!(parse_year_input(""), Ok(None));
        assert_eq!(parse_year_input("2019"), Ok(Some(YearFilter::from_year(2019))));
        assert_eq!(
            parse_year_input("2018-2020"),
            Ok(Some(YearFilter::between(2018, 2020)))
        );
        assert_eq!(
            parse_year_input("2018 - 2020 "),
            Ok(Some(YearFilter::between(2018, 2020)))
        );
        assert!(matches!(parse_year_input("19"), Err(ValidationError::InvalidYear(_))));
        assert!(matches!(parse_year_input("2018-"), Err(ValidationError::InvalidYear(_))));
        assert!(matches!(parse_year_input("abcd"), Err(ValidationError::InvalidYear(_))));
        assert_eq!(
            parse_year_input("2020-2018"),
            Err(ValidationError::ReversedYears { start: 2020, end: 2018 })
        );
    }

    #[test]
    fn test_valid_advanced_form() {
        let form = SearchForm {
            categories: "Medicine, immunology".to_string(),
            journals: "Nature, The Lancet, Nature".to_string(),
            pubyear: "2017-2020".to_string(),
            deep: true,
            ..advanced()
        };
        let query = form.validate(&[]).unwrap();
        assert_eq!(query.query.as_deref(), Some("influenza"));
        assert_eq!(query.categories, vec!["medicine", "immunology"]);
        assert_eq!(query.journals, vec!["Nature", "The Lancet"]);
        assert_eq!(query.pubyears, Some(YearFilter::between(2017, 2020)));
        assert!(query.deep);
        assert_eq!(query.kind, QueryKind::New);
    }

    #[test]
    fn test_unknown_category_is_field_scoped() {
        let form = SearchForm {
            categories: "astrology".to_string(),
            ..advanced()
        };
        let err = form.validate(&[]).unwrap_err();
        assert_eq!(err, ValidationError::UnknownCategory("astrology".to_string()));
        assert_eq!(err.field(), FormField::Categories);
    }

    #[test]
    fn test_builtin_topics_are_the_service_vocabulary() {
        for topic in ["medicine", "Botany", " immunology "] {
            let form = SearchForm {
                categories: topic.to_string(),
                ..advanced()
            };
            assert!(form.validate(&[]).is_ok(), "{} should be accepted", topic);
        }

        let form = SearchForm {
            categories: "oncology".to_string(),
            ..advanced()
        };
        assert_eq!(
            form.validate(&[]).unwrap_err(),
            ValidationError::UnknownCategory("oncology".to_string())
        );
        assert!(form.validate(&["oncology".to_string()]).is_ok());
    }

    #[test]
    fn test_facet_categories_are_accepted() {
        let form = SearchForm {
            categories: "virology".to_string(),
            ..advanced()
        };
        let query = form.validate(&["virology".to_string()]).unwrap();
        assert_eq!(query.categories, vec!["virology"]);
    }

    #[test]
    fn test_advanced_fields_ignored_when_collapsed() {
        let form = SearchForm {
            query: "measles".to_string(),
            categories: "astrology".to_string(),
            pubyear: "not a year".to_string(),
            advanced: false,
            ..Default::default()
        };
        let query = form.validate(&[]).unwrap();
        assert!(query.categories.is_empty());
        assert_eq!(query.pubyears, None);
    }

    #[test]
    fn test_empty_form_rejected() {
        let err = SearchForm::default().validate(&[]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyQuery);
        assert_eq!(err.field(), FormField::Query);
    }

    #[test]
    fn test_filters_alone_are_enough() {
        let form = SearchForm {
            query: String::new(),
            journals: "BMJ".to_string(),
            advanced: true,
            ..Default::default()
        };
        assert!(form.validate(&[]).is_ok());
    }
}

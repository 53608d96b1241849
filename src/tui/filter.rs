//! Filter Modals
//!
//! State of the journal, topic and publication-year checklists shown over
//! the results view. Nothing touches the query until the modal is applied.

use crate::models::{Facets, QueryPatch, SearchQuery, YearFilter, KNOWN_TOPICS};

/// Facet a modal filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    Journal,
    Topic,
    Pubyear,
}

impl FacetKind {
    pub fn title(&self) -> &'static str {
        match self {
            FacetKind::Journal => " Filter by Journal ",
            FacetKind::Topic => " Filter by Topic ",
            FacetKind::Pubyear => " Filter by Publication Year ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterModal {
    pub kind: FacetKind,
    pub options: Vec<FilterOption>,
    pub cursor: usize,
}

impl FilterModal {
    /// Build the checklist from the latest facets plus whatever the query
    /// already selects, so active filters can always be cleared.
    pub fn open(kind: FacetKind, facets: &Facets, query: &SearchQuery) -> Self {
        let options = match kind {
            FacetKind::Journal => checklist(&facets.journals, &query.journals),
            FacetKind::Topic => {
                if facets.categories.is_empty() {
                    let topics: Vec<String> = KNOWN_TOPICS.iter().map(|t| t.to_string()).collect();
                    checklist(&topics, &query.categories)
                } else {
                    checklist(&facets.categories, &query.categories)
                }
            }
            FacetKind::Pubyear => {
                let mut years = facets.pubyears.clone();
                years.sort_unstable();
                years.dedup();
                years
                    .into_iter()
                    .map(|year| FilterOption {
                        value: year.to_string(),
                        selected: query.pubyears.is_some_and(|f| f.contains(year)),
                    })
                    .collect()
            }
        };

        Self {
            kind,
            options,
            cursor: 0,
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.options.len() {
            self.cursor += 1;
        }
    }

    /// Flip the option under the cursor
    pub fn toggle(&mut self) {
        if let Some(option) = self.options.get_mut(self.cursor) {
            option.selected = !option.selected;
        }
    }

    pub fn selected_values(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.clone())
            .collect()
    }

    /// Query change that applies this modal's selection as a follow-up search
    pub fn to_patch(&self) -> QueryPatch {
        let values = self.selected_values();
        match self.kind {
            FacetKind::Journal => QueryPatch::journals(values),
            FacetKind::Topic => QueryPatch::categories(values),
            FacetKind::Pubyear => {
                let years: Vec<u16> = values.iter().filter_map(|v| v.parse().ok()).collect();
                QueryPatch::pubyears(YearFilter::spanning(&years))
            }
        }
    }
}

fn checklist(available: &[String], selected: &[String]) -> Vec<FilterOption> {
    let mut options: Vec<FilterOption> = available
        .iter()
        .map(|value| FilterOption {
            value: value.clone(),
            selected: selected.contains(value),
        })
        .collect();

    for value in selected {
        if !available.contains(value) {
            options.push(FilterOption {
                value: value.clone(),
                selected: true,
            });
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryKind;

    fn facets() -> Facets {
        Facets {
            categories: vec!["medicine".to_string(), "botany".to_string()],
            journals: vec!["Nature".to_string(), "Cell".to_string()],
            pubyears: vec![2020, 2017, 2019],
        }
    }

    #[test]
    fn test_selected_values_missing_from_facets_stay_visible() {
        let query = SearchQuery {
            journals: vec!["BMJ".to_string()],
            ..Default::default()
        };
        let modal = FilterModal::open(FacetKind::Journal, &facets(), &query);
        let values: Vec<&str> = modal.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["Nature", "Cell", "BMJ"]);
        assert_eq!(modal.selected_values(), vec!["BMJ".to_string()]);
    }

    #[test]
    fn test_toggle_and_apply_journals() {
        let mut modal = FilterModal::open(FacetKind::Journal, &facets(), &SearchQuery::default());
        modal.move_down();
        modal.toggle();
        let patch = modal.to_patch();
        assert_eq!(patch.journals, Some(vec!["Cell".to_string()]));
        assert_eq!(patch.kind, Some(QueryKind::FollowUp));
    }

    #[test]
    fn test_year_selection_becomes_span() {
        let query = SearchQuery {
            pubyears: Some(YearFilter::from_year(2019)),
            ..Default::default()
        };
        let mut modal = FilterModal::open(FacetKind::Pubyear, &facets(), &query);
        let selected: Vec<bool> = modal.options.iter().map(|o| o.selected).collect();
        assert_eq!(selected, vec![false, true, true]);

        modal.toggle();
        assert_eq!(modal.to_patch().pubyears, Some(Some(YearFilter::between(2017, 2020))));
    }

    #[test]
    fn test_clearing_every_year_removes_filter() {
        let query = SearchQuery {
            pubyears: Some(YearFilter::between(2017, 2017)),
            ..Default::default()
        };
        let mut modal = FilterModal::open(FacetKind::Pubyear, &facets(), &query);
        modal.toggle();
        assert_eq!(modal.to_patch().pubyears, Some(None));
    }

    #[test]
    fn test_topics_fall_back_to_known_list() {
        let modal = FilterModal::open(FacetKind::Topic, &Facets::default(), &SearchQuery::default());
        assert_eq!(modal.options.len(), KNOWN_TOPICS.len());
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut modal = FilterModal::open(FacetKind::Journal, &facets(), &SearchQuery::default());
        modal.move_up();
        assert_eq!(modal.cursor, 0);
        for _ in 0..10 {
            modal.move_down();
        }
        assert_eq!(modal.cursor, 1);
    }
}

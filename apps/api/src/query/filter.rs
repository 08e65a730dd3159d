//! Predicate-and-sort pipeline over catalog slices.
//!
//! Criteria are optional and combine by AND. With no sort key the catalog
//! declaration order is preserved; with one, `sort_by` is stable so ties keep
//! their original relative order.

use std::cmp::Ordering;

type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + Send + Sync + 'a>;
type Comparator<'a, T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync + 'a>;

pub struct Query<'a, T> {
    predicates: Vec<Predicate<'a, T>>,
    order: Option<Comparator<'a, T>>,
}

impl<'a, T> Default for Query<'a, T> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            order: None,
        }
    }
}

impl<'a, T> Query<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unconditional predicate.
    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'a) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Adds a predicate only when the criterion was supplied.
    pub fn filter_by<V>(
        self,
        criterion: Option<V>,
        predicate: impl Fn(&T, &V) -> bool + Send + Sync + 'a,
    ) -> Self
    where
        V: Send + Sync + 'a,
    {
        match criterion {
            Some(value) => self.filter(move |item| predicate(item, &value)),
            None => self,
        }
    }

    pub fn sort_by(mut self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'a) -> Self {
        self.order = Some(Box::new(cmp));
        self
    }

    pub fn run<'b>(&self, items: &'b [T]) -> Vec<&'b T> {
        let mut matched: Vec<&'b T> = items
            .iter()
            .filter(|item| self.predicates.iter().all(|p| p(*item)))
            .collect();
        if let Some(cmp) = &self.order {
            matched.sort_by(|a, b| cmp(*a, *b));
        }
        matched
    }
}

/// Treats blank criteria the same as absent ones.
pub fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn eq_ignore_case(field: &str, value: &str) -> bool {
    field.to_lowercase() == value.to_lowercase()
}

pub fn contains_ignore_case(field: &str, term: &str) -> bool {
    field.to_lowercase().contains(&term.to_lowercase())
}

/// True when `term` is a substring of any of `fields`.
pub fn any_field_contains(fields: &[&str], term: &str) -> bool {
    let term = term.to_lowercase();
    fields.iter().any(|f| f.to_lowercase().contains(&term))
}

/// Inclusive range check with independently optional bounds.
pub fn within<V: PartialOrd>(value: V, min: Option<V>, max: Option<V>) -> bool {
    min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
}

/// Any-of membership: some target is a substring of some tag.
pub fn any_tag_matches(tags: &[String], targets: &[String]) -> bool {
    targets.iter().any(|target| {
        let target = target.to_lowercase();
        tags.iter().any(|tag| tag.to_lowercase().contains(&target))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row {
        name: &'static str,
        kind: &'static str,
        score: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Alpha", kind: "A", score: 3 },
            Row { name: "Beta", kind: "B", score: 1 },
            Row { name: "Gamma", kind: "a", score: 3 },
            Row { name: "Delta", kind: "B", score: 2 },
        ]
    }

    #[test]
    fn test_no_criteria_preserves_declaration_order() {
        let data = rows();
        let names: Vec<_> = Query::new().run(&data).iter().map(|r| r.name).collect();
        assert_eq!(names, ["Alpha", "Beta", "Gamma", "Delta"]);
    }

    #[test]
    fn test_criteria_combine_by_and() {
        let data = rows();
        let out = Query::new()
            .filter_by(Some("a".to_string()), |r: &Row, k| eq_ignore_case(r.kind, k))
            .filter_by(Some(3u32), |r: &Row, min| r.score >= *min)
            .run(&data);
        let names: Vec<_> = out.iter().map(|r| r.name).collect();
        assert_eq!(names, ["Alpha", "Gamma"]);
    }

    #[test]
    fn test_absent_criterion_does_not_filter() {
        let data = rows();
        let out = Query::new()
            .filter_by(None::<String>, |r: &Row, k| eq_ignore_case(r.kind, k))
            .run(&data);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let data = rows();
        let out = Query::new()
            .filter_by(Some("zzz".to_string()), |r: &Row, t| contains_ignore_case(r.name, t))
            .run(&data);
        assert!(out.is_empty());
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let data = rows();
        let out = Query::new()
            .sort_by(|a: &Row, b: &Row| b.score.cmp(&a.score))
            .run(&data);
        let names: Vec<_> = out.iter().map(|r| r.name).collect();
        assert_eq!(names, ["Alpha", "Gamma", "Delta", "Beta"]);
    }

    #[test]
    fn test_within_bounds_are_inclusive_and_optional() {
        assert!(within(5, Some(5), Some(5)));
        assert!(within(5, None, Some(9)));
        assert!(within(5, Some(1), None));
        assert!(!within(5, Some(6), None));
        assert!(!within(5.5, None, Some(5.0)));
    }

    #[test]
    fn test_any_field_contains_is_case_insensitive() {
        assert!(any_field_contains(&["IIT Delhi", "New Delhi"], "delhi"));
        assert!(!any_field_contains(&["IIT Delhi"], "bombay"));
    }

    #[test]
    fn test_any_tag_matches_substring_of_any_tag() {
        let tags = vec!["JEE Preparation".to_string(), "Placements".to_string()];
        assert!(any_tag_matches(&tags, &["jee".to_string()]));
        assert!(any_tag_matches(&tags, &["law".to_string(), "place".to_string()]));
        assert!(!any_tag_matches(&tags, &["law".to_string()]));
        assert!(!any_tag_matches(&tags, &[]));
    }

    #[test]
    fn test_present_drops_blank_values() {
        assert_eq!(present(Some("  ".to_string())), None);
        assert_eq!(present(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(present(None), None);
    }
}

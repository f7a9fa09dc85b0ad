//! Case-insensitive substring search over a fixed set of fields.
//!
//! The query is split on whitespace; every term must occur in at least one
//! field. Matching runs in Rust rather than SQL `LIKE`, which only folds
//! ASCII case in SQLite.

/// True when `query` is blank or every term occurs in one of `fields`.
pub fn matches(query: &str, fields: &[&str]) -> bool {
    let haystacks: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|term| haystacks.iter().any(|h| h.contains(&term)))
}

/// Keep the items whose searchable fields match `query`.
pub fn filter<T, F>(items: Vec<T>, query: Option<&str>, fields: F) -> Vec<T>
where
    F: Fn(&T) -> Vec<&str>,
{
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => items
            .into_iter()
            .filter(|item| matches(query, &fields(item)))
            .collect(),
        None => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case_across_scripts() {
        assert!(matches("преступление", &["Преступление и наказание"]));
        assert!(matches("RUST", &["", "the rust book"]));
        assert!(!matches("python", &["the rust book"]));
    }

    #[test]
    fn every_term_must_match_some_field() {
        let fields = ["Physics", "Drofa"];
        assert!(matches("physics drofa", &fields));
        assert!(!matches("physics prosveshchenie", &fields));
    }

    #[test]
    fn blank_query_keeps_everything() {
        let items = vec!["a", "b"];
        assert_eq!(filter(items.clone(), Some("  "), |s| vec![*s]), items);
        assert_eq!(filter(items.clone(), None, |s| vec![*s]), items);
        assert_eq!(filter(items, Some("B"), |s| vec![*s]), vec!["b"]);
    }
}

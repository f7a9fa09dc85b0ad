//! Page-number pagination for list endpoints.

use libris_http::AppError;
use libris_kernel::settings::PaginationSettings;
use serde::{Deserialize, Serialize};

/// Query string accepted by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub page: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Slice `items` according to `query`.
    ///
    /// A missing or unparsable `page_size` falls back to the configured
    /// default; larger values are capped. An out-of-range or non-numeric
    /// `page` is a 404, except page 1 of an empty list.
    pub fn paginate(
        items: Vec<T>,
        query: &ListQuery,
        settings: &PaginationSettings,
    ) -> Result<Self, AppError> {
        let page_size = query
            .page_size
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(settings.page_size)
            .min(settings.max_page_size)
            .max(1) as usize;

        let page = match query.page.as_deref() {
            None => 1,
            Some("last") => items.len().div_ceil(page_size).max(1),
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| AppError::not_found("Invalid page."))?,
        };

        let count = items.len();
        let pages = count.div_ceil(page_size).max(1);
        if page > pages {
            return Err(AppError::not_found("Invalid page."));
        }

        let results = items
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Ok(Self {
            count,
            page,
            next: (page < pages).then_some(page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PaginationSettings {
        PaginationSettings {
            page_size: 2,
            max_page_size: 3,
        }
    }

    fn query(page: Option<&str>, page_size: Option<&str>) -> ListQuery {
        ListQuery {
            search: None,
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn first_page_links_forward_only() {
        let page = Page::paginate(vec![1, 2, 3, 4, 5], &query(None, None), &settings()).unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![1, 2]);
        assert_eq!(page.next, Some(2));
        assert_eq!(page.previous, None);
    }

    #[test]
    fn last_page_is_partial() {
        let page =
            Page::paginate(vec![1, 2, 3, 4, 5], &query(Some("3"), None), &settings()).unwrap();
        assert_eq!(page.results, vec![5]);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));

        let last =
            Page::paginate(vec![1, 2, 3, 4, 5], &query(Some("last"), None), &settings()).unwrap();
        assert_eq!(last.page, 3);
    }

    #[test]
    fn page_size_is_capped() {
        let page =
            Page::paginate(vec![1, 2, 3, 4, 5], &query(None, Some("50")), &settings()).unwrap();
        assert_eq!(page.results, vec![1, 2, 3]);
    }

    #[test]
    fn empty_list_has_a_first_page() {
        let page = Page::<i32>::paginate(vec![], &query(None, None), &settings()).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }

    #[test]
    fn out_of_range_or_garbage_page_is_not_found() {
        assert!(matches!(
            Page::paginate(vec![1], &query(Some("2"), None), &settings()),
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            Page::paginate(vec![1], &query(Some("abc"), None), &settings()),
            Err(AppError::NotFound { .. })
        ));
    }
}

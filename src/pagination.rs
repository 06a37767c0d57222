//! Cursor-based connections for list results.
//!
//! Adapters ask services for `limit + 1` rows; the extra row only tells
//! whether another page exists and is never returned.

use serde::Serialize;

use crate::config::PaginationConfig;
use crate::cursor;
use crate::error::AppError;

/// A page request as received from a client.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Requested page size.
    pub first: Option<usize>,
    /// Cursor of the last item of the previous page.
    pub after: Option<String>,
}

impl PageRequest {
    pub fn new(first: Option<usize>, after: Option<String>) -> Self {
        Self { first, after }
    }

    /// Page size after applying the configured default and maximum.
    pub fn limit(&self, config: &PaginationConfig) -> usize {
        self.first
            .unwrap_or(config.default_limit)
            .min(config.max_limit)
    }

    /// Number of rows to fetch so that `has_next_page` can be decided.
    pub fn fetch_limit(&self, config: &PaginationConfig) -> usize {
        self.limit(config) + 1
    }

    /// Decodes the `after` cursor into an identity.
    pub fn after<I>(
        &self,
        from_key: impl FnOnce(u64) -> Result<I, AppError>,
    ) -> Result<Option<I>, AppError> {
        match self.after.as_deref() {
            None | Some("") => Ok(None),
            Some(token) => from_key(cursor::decode::<u64>(token)?).map(Some),
        }
    }
}

/// One item of a page together with its cursor.
#[derive(Debug, Clone, Serialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    /// Builds a page from rows fetched with a limit of `limit + 1`.
    ///
    /// `key` yields the cursor key of a row (its identity).
    pub fn from_overfetch(
        mut rows: Vec<T>,
        limit: usize,
        key: impl Fn(&T) -> Result<u64, AppError>,
    ) -> Result<Self, AppError> {
        let has_next_page = rows.len() > limit;
        rows.truncate(limit);

        let edges = rows
            .into_iter()
            .map(|node| {
                let cursor = cursor::encode(&key(&node)?)?;
                Ok(Edge { cursor, node })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let end_cursor = edges.last().map(|edge| edge.cursor.clone());
        Ok(Self {
            edges,
            page_info: PageInfo {
                has_next_page,
                end_cursor,
            },
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

/// Runs a keyset listing and wraps it in a [`Connection`].
///
/// `fetch` receives the decoded `after` key and the over-fetch limit; `key`
/// yields the cursor key of a row.
pub async fn paginate<I, T, F, Fut>(
    request: PageRequest,
    config: &PaginationConfig,
    from_key: impl FnOnce(u64) -> Result<I, AppError>,
    fetch: F,
    key: impl Fn(&T) -> Result<u64, AppError>,
) -> Result<Connection<T>, AppError>
where
    F: FnOnce(Option<I>, usize) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<T>, AppError>>,
{
    let limit = request.limit(config);
    let after = request.after(from_key)?;
    let rows = fetch(after, request.fetch_limit(config)).await?;
    Connection::from_overfetch(rows, limit, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{NamespaceId, TermId};

    fn ids(range: std::ops::RangeInclusive<i64>) -> Vec<TermId> {
        range.map(TermId).collect()
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        let config = PaginationConfig::default();
        assert_eq!(PageRequest::default().limit(&config), 20);
        assert_eq!(PageRequest::new(Some(5), None).limit(&config), 5);
        assert_eq!(PageRequest::new(Some(5000), None).limit(&config), 100);
        assert_eq!(PageRequest::new(Some(5), None).fetch_limit(&config), 6);
    }

    #[test]
    fn test_overfetched_row_sets_has_next_page() {
        let page = Connection::from_overfetch(ids(1..=4), 3, |id| id.to_cursor_key()).unwrap();

        assert_eq!(page.edges.len(), 3);
        assert!(page.page_info.has_next_page);
        let last: u64 = cursor::decode(page.page_info.end_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(last, 3);
    }

    #[test]
    fn test_exact_page_has_no_next_page() {
        let page = Connection::from_overfetch(ids(1..=3), 3, |id| id.to_cursor_key()).unwrap();
        assert_eq!(page.edges.len(), 3);
        assert!(!page.page_info.has_next_page);

        let empty =
            Connection::from_overfetch(Vec::<TermId>::new(), 3, |id| id.to_cursor_key()).unwrap();
        assert!(empty.page_info.end_cursor.is_none());
    }

    #[test]
    fn test_after_cursor_round_trip() {
        let page = Connection::from_overfetch(ids(7..=7), 1, |id| id.to_cursor_key()).unwrap();
        let request = PageRequest::new(None, Some(page.edges[0].cursor.clone()));
        assert_eq!(request.after(TermId::from_cursor_key).unwrap(), Some(TermId(7)));
    }

    #[test]
    fn test_corrupt_after_cursor_is_a_decode_failure() {
        let request = PageRequest::new(None, Some("%%%".into()));
        let err = request.after(TermId::from_cursor_key).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn test_paginate_over_fetches_and_resumes() {
        let config = PaginationConfig {
            default_limit: 2,
            max_limit: 10,
        };
        let all: Vec<NamespaceId> = (1..=5).map(NamespaceId).collect();
        let listing = |after: Option<NamespaceId>, limit: usize| {
            let rows: Vec<NamespaceId> = all
                .iter()
                .copied()
                .filter(|id| after.map_or(true, |a| *id > a))
                .take(limit)
                .collect();
            async move { Ok(rows) }
        };

        let first = paginate(
            PageRequest::default(),
            &config,
            NamespaceId::from_cursor_key,
            listing,
            |id: &NamespaceId| id.to_cursor_key(),
        )
        .await
        .unwrap();
        assert_eq!(first.nodes().copied().collect::<Vec<_>>(), all[..2]);
        assert!(first.page_info.has_next_page);

        let last = paginate(
            PageRequest::new(Some(5), first.page_info.end_cursor.clone()),
            &config,
            NamespaceId::from_cursor_key,
            listing,
            |id: &NamespaceId| id.to_cursor_key(),
        )
        .await
        .unwrap();
        assert_eq!(last.nodes().copied().collect::<Vec<_>>(), all[2..]);
        assert!(!last.page_info.has_next_page);
    }
}

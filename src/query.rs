//! Generic connection resolution
//!
//! One shared pipeline backs every paginated field: validate the connection
//! arguments, fetch the scoped candidate documents through [`EntitySource`],
//! filter and sort them, window by `after`/`before` cursors, slice by
//! `first`/`last`, and assemble the Relay connection. Concrete loaders
//! (see [`crate::loaders`]) only parameterize this pipeline with an entity
//! label, a sortable-field allow-list, and a filter predicate.

use async_graphql::Enum;
use async_trait::async_trait;
use tracing::error;

use crate::cursor::CursorCodec;
use crate::i18n::{EntityLabel, Locale};
use crate::pagination::{Connection, Edge, PageDirection, PageInfo, PaginationInput};
use crate::types::DateTime;
use crate::{LoaderError, Result};

/// Who is asking, and in which language failures must be reported.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
    pub locale: Locale,
}

/// Sort direction for the primary ordering field.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Primary ordering of a connection: an allow-listed field plus direction.
///
/// Ties always break ascending on the document key regardless of
/// `direction`, so repeated requests paginate identically.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

/// Comparable value extracted from a record for ordering.
///
/// A given sort field always yields one variant; the loader's extractor
/// decides which.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Number(i64),
    Time(DateTime),
}

/// Entity-agnostic connection filters.
///
/// Date bounds are inclusive on both ends; search is a case-insensitive
/// substring match over whichever localized name fields the loader exposes.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub search: Option<String>,
    pub start_date: Option<DateTime>,
    pub end_date: Option<DateTime>,
}

impl Filters {
    pub fn in_date_range(&self, at: &DateTime) -> bool {
        if let Some(start) = &self.start_date {
            if at < start {
                return false;
            }
        }
        if let Some(end) = &self.end_date {
            if at > end {
                return false;
            }
        }
        true
    }

    pub fn matches_search(&self, fields: &[&str]) -> bool {
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                fields
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Everything one connection resolution needs beyond the request context:
/// the parent scope, the page window, ordering, and filters.
#[derive(Debug, Clone, Default)]
pub struct ConnectionQuery {
    /// Parent document id the connection hangs off (domain, user, org).
    pub scope_id: String,
    pub page: PaginationInput,
    pub order: Option<OrderBy>,
    pub filters: Filters,
}

/// A record that can appear as a connection node.
pub trait ConnectionNode: Clone + Send + Sync {
    /// Type discriminator baked into this node's cursors.
    const TYPE_NAME: &'static str;

    /// Unique document key, also the pagination tie-break.
    fn key(&self) -> &str;
}

/// Data-access seam between the connection pipeline and the database layer.
///
/// Implementations return every candidate document for one parent scope;
/// filtering, ordering, and windowing happen in the pipeline so their
/// semantics stay identical across entities. The handed-in source is only
/// read, never mutated.
#[async_trait]
pub trait EntitySource: Send + Sync {
    type Node: ConnectionNode;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self, scope_id: &str) -> std::result::Result<Vec<Self::Node>, Self::Error>;
}

type SortKeyFn<T> = fn(&T) -> SortKey;
type FilterFn<T> = fn(&T, &Filters) -> bool;

/// Per-entity parameterization of the shared connection pipeline.
///
/// Intentionally declarative: a loader carries no behavior of its own
/// beyond naming the entity, allow-listing its sortable fields, and
/// supplying the filter predicate.
pub struct ConnectionLoader<T> {
    name: &'static str,
    entity: EntityLabel,
    sort_fields: Vec<(&'static str, SortKeyFn<T>)>,
    filter: FilterFn<T>,
}

impl<T: ConnectionNode> ConnectionLoader<T> {
    pub fn new(name: &'static str, entity: EntityLabel) -> Self {
        Self {
            name,
            entity,
            sort_fields: Vec::new(),
            filter: |_, _| true,
        }
    }

    /// Allow-list a sortable field.
    pub fn sortable(mut self, field: &'static str, extract: SortKeyFn<T>) -> Self {
        self.sort_fields.push((field, extract));
        self
    }

    /// Set the filter predicate applied to every candidate document.
    pub fn filtered(mut self, filter: FilterFn<T>) -> Self {
        self.filter = filter;
        self
    }

    /// Loader name as it appears in audit logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Localized entity label used in user-facing messages.
    pub fn entity(&self) -> EntityLabel {
        self.entity
    }

    /// Look up the extractor for an ordering field.
    ///
    /// An unknown field means the resolver layer forwarded an ordering the
    /// schema never offered; that is a programmer error, not user input.
    fn extractor(&self, field: &str) -> SortKeyFn<T> {
        self.sort_fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, extract)| *extract)
            .unwrap_or_else(|| {
                panic!(
                    "{}: orderBy field {field:?} is not in the sortable-field allow-list",
                    self.name
                )
            })
    }

    fn decode_cursor(&self, cursor: &str) -> Result<String> {
        let (type_name, key) = CursorCodec::decode(cursor)?;
        if type_name != T::TYPE_NAME {
            return Err(LoaderError::InvalidCursor(format!(
                "expected a {} cursor, got {type_name}",
                T::TYPE_NAME
            )));
        }
        Ok(key)
    }

    /// Resolve one connection request end to end.
    pub async fn resolve<S>(
        &self,
        source: &S,
        ctx: &RequestContext,
        query: &ConnectionQuery,
    ) -> Result<Connection<T>>
    where
        S: EntitySource<Node = T>,
    {
        let args = query.page.validate(&ctx.user_id, self.name, self.entity)?;

        // Resolve the ordering before touching the database so a bad field
        // fails fast even on empty scopes.
        let ordering = query
            .order
            .as_ref()
            .map(|order| (self.extractor(&order.field), order.direction));

        let mut candidates = match source.fetch(&query.scope_id).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(
                    user_id = %ctx.user_id,
                    scope_id = %query.scope_id,
                    loader = self.name,
                    error = %err,
                    "database error occurred while resolving connection"
                );
                return Err(LoaderError::Load {
                    entity: self.entity,
                });
            }
        };

        candidates.retain(|node| (self.filter)(node, &query.filters));

        match &ordering {
            Some((extract, direction)) => candidates.sort_by(|a, b| {
                let cmp = match direction {
                    OrderDirection::Asc => extract(a).cmp(&extract(b)),
                    OrderDirection::Desc => extract(b).cmp(&extract(a)),
                };
                cmp.then_with(|| a.key().cmp(b.key()))
            }),
            None => candidates.sort_by(|a, b| a.key().cmp(b.key())),
        }

        let total = candidates.len();
        let mut lo = 0usize;
        let mut hi = total;

        if let Some(after) = &query.page.after {
            let key = self.decode_cursor(after)?;
            let pos = candidates
                .iter()
                .position(|node| node.key() == key)
                .ok_or(LoaderError::CursorNotFound {
                    entity: self.entity,
                })?;
            lo = pos + 1;
        }

        if let Some(before) = &query.page.before {
            let key = self.decode_cursor(before)?;
            let pos = candidates
                .iter()
                .position(|node| node.key() == key)
                .ok_or(LoaderError::CursorNotFound {
                    entity: self.entity,
                })?;
            hi = pos.min(hi);
        }

        // Contradictory cursors collapse to an empty window at `lo`.
        hi = hi.max(lo);

        let limit = args.limit as usize;
        match args.direction {
            PageDirection::Forward => hi = hi.min(lo + limit),
            PageDirection::Backward => lo = lo.max(hi - limit.min(hi)),
        }

        let edges: Vec<Edge<T>> = candidates[lo..hi]
            .iter()
            .map(|node| Edge {
                cursor: CursorCodec::encode(T::TYPE_NAME, node.key()),
                node: node.clone(),
            })
            .collect();

        let page_info = PageInfo {
            has_next_page: hi < total,
            has_previous_page: lo > 0,
            start_cursor: edges.first().map(|e| e.cursor.clone()).unwrap_or_default(),
            end_cursor: edges.last().map(|e| e.cursor.clone()).unwrap_or_default(),
        };

        Ok(Connection {
            edges,
            total_count: total as u64,
            page_info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        key: String,
        rank: i64,
        name: String,
    }

    impl Item {
        fn new(key: &str, rank: i64, name: &str) -> Self {
            Self {
                key: key.to_string(),
                rank,
                name: name.to_string(),
            }
        }
    }

    impl ConnectionNode for Item {
        const TYPE_NAME: &'static str = "Item";

        fn key(&self) -> &str {
            &self.key
        }
    }

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct Refused;

    struct MemorySource {
        rows: Vec<Item>,
        fail: bool,
    }

    #[async_trait]
    impl EntitySource for MemorySource {
        type Node = Item;
        type Error = Refused;

        async fn fetch(&self, _scope_id: &str) -> std::result::Result<Vec<Item>, Refused> {
            if self.fail {
                Err(Refused)
            } else {
                Ok(self.rows.clone())
            }
        }
    }

    fn loader() -> ConnectionLoader<Item> {
        ConnectionLoader::new(
            "loadItemConnections",
            EntityLabel {
                en: "item",
                fr: "article",
            },
        )
        .sortable("rank", |item: &Item| SortKey::Number(item.rank))
        .sortable("name", |item: &Item| SortKey::Text(item.name.clone()))
        .filtered(|item, filters| filters.matches_search(&[&item.name]))
    }

    fn source() -> MemorySource {
        MemorySource {
            rows: vec![
                Item::new("items/3", 30, "charlie"),
                Item::new("items/1", 10, "alpha"),
                Item::new("items/2", 20, "bravo"),
            ],
            fail: false,
        }
    }

    fn ctx() -> RequestContext {
        RequestContext {
            user_id: "users/42".to_string(),
            locale: Locale::En,
        }
    }

    fn forward(first: i32) -> ConnectionQuery {
        ConnectionQuery {
            page: PaginationInput {
                first: Some(first),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_forward_window_and_flags() {
        let conn = loader().resolve(&source(), &ctx(), &forward(2)).await.unwrap();

        // no ordering requested: key order
        let keys: Vec<&str> = conn.edges.iter().map(|e| e.node.key()).collect();
        assert_eq!(keys, ["items/1", "items/2"]);
        assert_eq!(conn.total_count, 3);
        assert!(conn.page_info.has_next_page);
        assert!(!conn.page_info.has_previous_page);
        assert_eq!(conn.page_info.start_cursor, conn.edges[0].cursor);
        assert_eq!(conn.page_info.end_cursor, conn.edges[1].cursor);
    }

    #[tokio::test]
    async fn test_backward_takes_the_last_records_in_order() {
        let query = ConnectionQuery {
            page: PaginationInput {
                last: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        let conn = loader().resolve(&source(), &ctx(), &query).await.unwrap();

        let keys: Vec<&str> = conn.edges.iter().map(|e| e.node.key()).collect();
        assert_eq!(keys, ["items/2", "items/3"]);
        assert!(!conn.page_info.has_next_page);
        assert!(conn.page_info.has_previous_page);
    }

    #[tokio::test]
    async fn test_order_by_descending_reverses_field_not_tiebreak() {
        let rows = vec![
            Item::new("items/2", 10, "same"),
            Item::new("items/1", 10, "same"),
            Item::new("items/3", 5, "other"),
        ];
        let source = MemorySource { rows, fail: false };
        let query = ConnectionQuery {
            page: PaginationInput {
                first: Some(10),
                ..Default::default()
            },
            order: Some(OrderBy {
                field: "rank".to_string(),
                direction: OrderDirection::Desc,
            }),
            ..Default::default()
        };
        let conn = loader().resolve(&source, &ctx(), &query).await.unwrap();

        let keys: Vec<&str> = conn.edges.iter().map(|e| e.node.key()).collect();
        // equal ranks still break ascending by key
        assert_eq!(keys, ["items/1", "items/2", "items/3"]);
    }

    #[tokio::test]
    async fn test_window_between_cursors() {
        let after = CursorCodec::encode("Item", "items/1");
        let before = CursorCodec::encode("Item", "items/3");
        let query = ConnectionQuery {
            page: PaginationInput {
                first: Some(5),
                after: Some(after),
                before: Some(before),
                ..Default::default()
            },
            order: Some(OrderBy {
                field: "rank".to_string(),
                direction: OrderDirection::Asc,
            }),
            ..Default::default()
        };
        let conn = loader().resolve(&source(), &ctx(), &query).await.unwrap();

        let keys: Vec<&str> = conn.edges.iter().map(|e| e.node.key()).collect();
        assert_eq!(keys, ["items/2"]);
        assert_eq!(conn.total_count, 3);
        assert!(conn.page_info.has_next_page);
        assert!(conn.page_info.has_previous_page);
    }

    #[tokio::test]
    async fn test_zero_limit_returns_no_edges_but_reports_remainder() {
        let conn = loader().resolve(&source(), &ctx(), &forward(0)).await.unwrap();

        assert!(conn.edges.is_empty());
        assert_eq!(conn.total_count, 3);
        assert!(conn.page_info.has_next_page);
        assert!(!conn.page_info.has_previous_page);
        assert_eq!(conn.page_info.start_cursor, "");
        assert_eq!(conn.page_info.end_cursor, "");
    }

    #[tokio::test]
    async fn test_empty_result_shape() {
        let source = MemorySource {
            rows: Vec::new(),
            fail: false,
        };
        let conn = loader().resolve(&source, &ctx(), &forward(5)).await.unwrap();

        assert!(conn.edges.is_empty());
        assert_eq!(conn.total_count, 0);
        assert_eq!(conn.page_info, PageInfo::empty());
    }

    #[tokio::test]
    async fn test_search_filter_shrinks_total_count() {
        let query = ConnectionQuery {
            page: PaginationInput {
                first: Some(10),
                ..Default::default()
            },
            filters: Filters {
                search: Some("ALPH".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let conn = loader().resolve(&source(), &ctx(), &query).await.unwrap();

        assert_eq!(conn.total_count, 1);
        assert_eq!(conn.edges[0].node.name, "alpha");
    }

    #[tokio::test]
    async fn test_source_failure_maps_to_load_error() {
        let source = MemorySource {
            rows: Vec::new(),
            fail: true,
        };
        let err = loader()
            .resolve(&source, &ctx(), &forward(5))
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::Load { .. }));
        // the underlying cause never reaches the user-facing message
        let message = err.message(Locale::En);
        assert_eq!(message, "Unable to load item(s). Please try again.");
        assert!(!message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_cursor_for_missing_record_is_not_found() {
        let after = CursorCodec::encode("Item", "items/999");
        let query = ConnectionQuery {
            page: PaginationInput {
                first: Some(5),
                after: Some(after),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = loader().resolve(&source(), &ctx(), &query).await.unwrap_err();
        assert!(matches!(err, LoaderError::CursorNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cursor_for_wrong_type_is_invalid() {
        let after = CursorCodec::encode("Domain", "items/1");
        let query = ConnectionQuery {
            page: PaginationInput {
                first: Some(5),
                after: Some(after),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = loader().resolve(&source(), &ctx(), &query).await.unwrap_err();
        assert!(matches!(err, LoaderError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_repeated_requests_paginate_stably() {
        let first_page = loader().resolve(&source(), &ctx(), &forward(2)).await.unwrap();
        let again = loader().resolve(&source(), &ctx(), &forward(2)).await.unwrap();
        let keys: Vec<&str> = first_page.edges.iter().map(|e| e.node.key()).collect();
        let keys_again: Vec<&str> = again.edges.iter().map(|e| e.node.key()).collect();
        assert_eq!(keys, keys_again);

        let query = ConnectionQuery {
            page: PaginationInput {
                first: Some(2),
                after: Some(first_page.page_info.end_cursor.clone()),
                ..Default::default()
            },
            ..Default::default()
        };
        let second_page = loader().resolve(&source(), &ctx(), &query).await.unwrap();
        assert_eq!(second_page.edges.len(), 1);
        assert_eq!(second_page.edges[0].node.key(), "items/3");
        assert!(!second_page.page_info.has_next_page);
    }

    #[tokio::test]
    #[should_panic(expected = "not in the sortable-field allow-list")]
    async fn test_unknown_order_field_panics() {
        let query = ConnectionQuery {
            page: PaginationInput {
                first: Some(5),
                ..Default::default()
            },
            order: Some(OrderBy {
                field: "no-such-field".to_string(),
                direction: OrderDirection::Asc,
            }),
            ..Default::default()
        };
        let _ = loader().resolve(&source(), &ctx(), &query).await;
    }

    #[test]
    fn test_date_range_is_inclusive() {
        use chrono::{TimeZone, Utc};

        let day = |d: u32| DateTime(Utc.with_ymd_and_hms(2021, 1, d, 0, 0, 0).unwrap());
        let filters = Filters {
            start_date: Some(day(26)),
            end_date: Some(day(28)),
            ..Default::default()
        };

        assert!(!filters.in_date_range(&day(25)));
        assert!(filters.in_date_range(&day(26)));
        assert!(filters.in_date_range(&day(27)));
        assert!(filters.in_date_range(&day(28)));
        assert!(!filters.in_date_range(&day(29)));
    }
}

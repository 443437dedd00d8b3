//! Relay-style cursor pagination
//!
//! Connection arguments, their validation, and the output types every
//! paginated field resolves to. See the Relay Cursor Connections
//! Specification: https://relay.dev/graphql/connections.htm

use async_graphql::{InputObject, Object, SimpleObject};
use tracing::warn;

use crate::i18n::EntityLabel;
use crate::{LoaderError, Result};

/// Hard cap on page size, shared by every connection.
pub const MAX_PAGE_SIZE: i32 = 100;

/// Page information
#[derive(SimpleObject, Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: String,
    pub end_cursor: String,
}

impl PageInfo {
    /// Page info for an empty result set: both flags false, empty cursors.
    pub fn empty() -> Self {
        Self {
            has_next_page: false,
            has_previous_page: false,
            start_cursor: String::new(),
            end_cursor: String::new(),
        }
    }
}

/// Edge in a connection
#[derive(Debug, Clone)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[Object]
impl<T: async_graphql::OutputType> Edge<T> {
    async fn cursor(&self) -> &str {
        &self.cursor
    }

    async fn node(&self) -> &T {
        &self.node
    }
}

/// Connection (paginated result)
#[derive(Debug, Clone)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub total_count: u64,
    pub page_info: PageInfo,
}

#[Object]
impl<T: async_graphql::OutputType> Connection<T> {
    async fn edges(&self) -> &[Edge<T>] {
        &self.edges
    }

    /// Count over the filtered set, not the returned window.
    async fn total_count(&self) -> u64 {
        self.total_count
    }

    async fn page_info(&self) -> &PageInfo {
        &self.page_info
    }
}

impl<T> Connection<T> {
    /// Create empty connection
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            total_count: 0,
            page_info: PageInfo::empty(),
        }
    }
}

/// Pagination input for GraphQL queries
///
/// Exactly one of `first` (forward) and `last` (backward) must be set;
/// `after`/`before` are exclusive window bounds.
#[derive(InputObject, Debug, Clone, Default)]
pub struct PaginationInput {
    /// Number of items to return (forward pagination)
    pub first: Option<i32>,

    /// Cursor to start after (forward pagination)
    pub after: Option<String>,

    /// Number of items to return (backward pagination)
    pub last: Option<i32>,

    /// Cursor to stop before (backward pagination)
    pub before: Option<String>,
}

/// Which direction a validated page request walks the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Forward,
    Backward,
}

/// A validated page request: the limit and the direction it applies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageArgs {
    pub limit: u32,
    pub direction: PageDirection,
}

/// Which limit argument an invalid value arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitArg {
    First,
    Last,
}

impl LimitArg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

/// The specific way a pagination request was invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationIssue {
    /// Both `first` and `last` were set.
    BothLimits,
    /// Neither `first` nor `last` was set.
    NoLimit,
    /// A limit was negative.
    Negative { arg: LimitArg, value: i32 },
    /// A limit exceeded [`MAX_PAGE_SIZE`].
    ExceedsMax { arg: LimitArg, value: i32 },
}

impl PaginationInput {
    /// Validate pagination input
    ///
    /// Fails when both or neither of `first`/`last` are set, or when the
    /// provided limit falls outside `[0, 100]`. Every rejection is logged
    /// as an audit event naming the user and the loader.
    pub fn validate(
        &self,
        user_id: &str,
        loader: &'static str,
        entity: EntityLabel,
    ) -> Result<PageArgs> {
        let issue = match (self.first, self.last) {
            (Some(_), Some(_)) => Some(PaginationIssue::BothLimits),
            (None, None) => Some(PaginationIssue::NoLimit),
            (Some(first), None) if first < 0 => Some(PaginationIssue::Negative {
                arg: LimitArg::First,
                value: first,
            }),
            (Some(first), None) if first > MAX_PAGE_SIZE => Some(PaginationIssue::ExceedsMax {
                arg: LimitArg::First,
                value: first,
            }),
            (None, Some(last)) if last < 0 => Some(PaginationIssue::Negative {
                arg: LimitArg::Last,
                value: last,
            }),
            (None, Some(last)) if last > MAX_PAGE_SIZE => Some(PaginationIssue::ExceedsMax {
                arg: LimitArg::Last,
                value: last,
            }),
            _ => None,
        };

        if let Some(issue) = issue {
            warn!(
                user_id,
                loader,
                issue = ?issue,
                "user attempted to paginate with invalid arguments"
            );
            return Err(LoaderError::InvalidPagination { issue, entity });
        }

        match (self.first, self.last) {
            (Some(first), None) => Ok(PageArgs {
                limit: first as u32,
                direction: PageDirection::Forward,
            }),
            (None, Some(last)) => Ok(PageArgs {
                limit: last as u32,
                direction: PageDirection::Backward,
            }),
            // both-set and neither-set were rejected above
            _ => unreachable!(),
        }
    }
}

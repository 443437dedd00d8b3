//! # tracker-graphql-helpers
//!
//! GraphQL utilities for the Tracker domain-security scanning platform.
//!
//! ## Features
//!
//! - **Cursor Pagination** - Relay-style cursor connections with totalCount
//! - **Typed Cursors** - opaque base64 `typeName:key` identifiers
//! - **Connection Loaders** - one generic pipeline, declaratively
//!   instantiated per entity (SSL scans, affiliations, domains, organizations)
//! - **Localized Errors** - en/fr user-facing messages, English server logs
//! - **DataLoader** - request-scoped batch loading for N+1 prevention
//!
//! ## Usage
//!
//! ```rust
//! use tracker_graphql_helpers::CursorCodec;
//!
//! let cursor = CursorCodec::encode("Domain", "domains/1");
//! let (type_name, key) = CursorCodec::decode(&cursor).unwrap();
//! assert_eq!((type_name.as_str(), key.as_str()), ("Domain", "domains/1"));
//! ```

pub mod cursor;
pub mod dataloaders;
pub mod i18n;
pub mod loaders;
pub mod pagination;
pub mod query;
pub mod types;

pub use cursor::CursorCodec;
pub use dataloaders::{BatchLoader, RequestLoader};
pub use i18n::{EntityLabel, Locale};
pub use pagination::{
    Connection, Edge, LimitArg, PageArgs, PageDirection, PageInfo, PaginationInput,
    PaginationIssue, MAX_PAGE_SIZE,
};
pub use query::{
    ConnectionLoader, ConnectionNode, ConnectionQuery, EntitySource, Filters, OrderBy,
    OrderDirection, RequestContext, SortKey,
};
pub use types::DateTime;

use thiserror::Error;

/// Connection resolution errors
///
/// `Display` is the English diagnostic written to server logs;
/// [`LoaderError::message`] selects the localized string surfaced to the
/// caller. Upstream causes are logged where they occur and never appear in
/// the user-facing message.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("invalid pagination arguments: {issue:?}")]
    InvalidPagination {
        issue: PaginationIssue,
        entity: EntityLabel,
    },

    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("cursor target not found in {} connection", .entity.en)]
    CursorNotFound { entity: EntityLabel },

    #[error("unable to load {}(s)", .entity.en)]
    Load { entity: EntityLabel },
}

impl LoaderError {
    /// The localized message surfaced to the API caller.
    pub fn message(&self, locale: Locale) -> String {
        match self {
            Self::InvalidPagination { issue, entity } => {
                i18n::pagination_message(locale, *issue, entity)
            }
            Self::InvalidCursor(_) => i18n::invalid_cursor(locale),
            Self::CursorNotFound { entity } => i18n::not_found(locale, entity),
            Self::Load { entity } => i18n::unable_to_load(locale, entity),
        }
    }
}

/// Result type for connection operations
pub type Result<T> = std::result::Result<T, LoaderError>;

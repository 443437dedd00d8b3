//! Common GraphQL types

use async_graphql::{Scalar, ScalarType, Value};
use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 3339 DateTime scalar
///
/// Used for scan timestamps and the inclusive date-range filters on
/// connection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateTime(pub ChronoDateTime<Utc>);

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> async_graphql::InputValueResult<Self> {
        if let Value::String(s) = value {
            Ok(DateTime(
                ChronoDateTime::parse_from_rfc3339(&s)
                    .map_err(|e| format!("Invalid DateTime: {}", e))?
                    .with_timezone(&Utc),
            ))
        } else {
            Err("Expected string for DateTime".into())
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_rfc3339())
    }
}

impl From<ChronoDateTime<Utc>> for DateTime {
    fn from(inner: ChronoDateTime<Utc>) -> Self {
        Self(inner)
    }
}

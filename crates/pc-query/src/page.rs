//! Page shapes returned by the query endpoints.

use serde::Deserialize;
use serde_json::Value;

/// One page of a cursor-paginated query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    /// Records in server order. `null` and absent both mean no records.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,
    /// Whether another page follows.
    #[serde(default)]
    pub has_next: bool,
    /// Opaque continuation cursor for the next request.
    #[serde(default)]
    pub search_after: Option<Value>,
}

impl ResultPage {
    /// The continuation cursor, treating JSON `null` as absent.
    pub fn cursor(&self) -> Option<&Value> {
        self.search_after.as_ref().filter(|v| !v.is_null())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Records of an offset-paged query with the total the server reported.
///
/// `total` comes from the `Total-count` header of the first page and may
/// differ from `records.len()` when the collection changes mid-query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetResult {
    pub total: u64,
    pub records: Vec<Value>,
}

/// Parse an offset-paged response body: a JSON array, with `null` or an
/// empty body meaning no records.
pub(crate) fn parse_offset_page(body: &str) -> serde_json::Result<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str::<Option<Vec<Value>>>(body)?.unwrap_or_default())
}

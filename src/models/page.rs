//! Page and pagination cursor structures.

use serde::{Deserialize, Serialize};

use crate::models::Post;

/// Continuation token for the next batch of a section feed.
///
/// Opaque to callers: its layout follows whichever upstream contract is
/// currently observed and carries no stability guarantee. A cursor must only
/// be fed back to the section that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Upstream page identifier
    pub id: String,

    /// Number of posts the next request should return
    pub count: u32,
}

impl PageCursor {
    /// Render the cursor as the query string the listing endpoint expects.
    pub(crate) fn to_query(&self) -> String {
        format!("id={}&c={}", self.id, self.count)
    }
}

/// One fetched batch of posts. Never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Cursor that produced this page; `None` for a section's first page
    pub current: Option<PageCursor>,

    /// Cursor for the next batch; `None` when the feed is exhausted
    pub next: Option<PageCursor>,

    /// Posts in upstream order
    pub posts: Vec<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_to_query() {
        let cursor = PageCursor {
            id: "abc123".into(),
            count: 10,
        };
        assert_eq!(cursor.to_query(), "id=abc123&c=10");
    }
}

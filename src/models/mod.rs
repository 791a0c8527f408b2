//! Data models for the discussion service.
//!
//! Records serialize as flat objects with snake_case keys and epoch-second timestamps.

mod comment;
mod discussion;
mod member;
mod topic;

pub use comment::*;
pub use discussion::*;
pub use member::*;
pub use topic::*;

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Offset/limit window for filtered range scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

// Invalidation tags.
// A closed set of labels linking cached queries to the mutations that stale them.

use std::fmt;

/// Label attached to cached query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Books,
    Borrow,
}

impl Tag {
    pub const ALL: [Tag; 2] = [Tag::Books, Tag::Borrow];

    pub fn name(&self) -> &'static str {
        match self {
            Tag::Books => "Books",
            Tag::Borrow => "Borrow",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// True if the two tag sets share at least one tag.
pub fn intersects(a: &[Tag], b: &[Tag]) -> bool {
    a.iter().any(|tag| b.contains(tag))
}

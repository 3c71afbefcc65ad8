//! Candidate pools for resolving JSON member names to schema nodes.
//!
//! One abstraction covers both matching modes. A *schema* pool is the
//! declaration-ordered child list of the enclosing element, consumed
//! destructively as members match. A *replay* pool is the list captured from
//! a repeating array's first item; entries are only marked consumed so the
//! pool can be rewound for the next sibling item.
//!
//! Either way, a scan starts at the position remembered from the previous
//! match and performs at most one full wrap, which is what allows JSON
//! members to arrive out of schema declaration order. A name still unmatched
//! after one wrap is not in the pool, and the caller reports it.

use std::sync::Arc;

use crate::schema::SchemaNode;

#[derive(Debug)]
pub(crate) struct MatchPool {
    entries: Vec<Arc<SchemaNode>>,
    consumed: Vec<bool>,
    cursor: usize,
    replaying: bool,
}

impl MatchPool {
    /// A destructive pool over schema-declared children.
    pub(crate) fn schema(entries: Vec<Arc<SchemaNode>>) -> Self {
        Self {
            entries,
            consumed: Vec::new(),
            cursor: 0,
            replaying: false,
        }
    }

    /// A replaying pool over the nodes captured from an array's first item.
    pub(crate) fn replay(entries: Vec<Arc<SchemaNode>>) -> Self {
        let consumed = vec![false; entries.len()];
        Self {
            entries,
            consumed,
            cursor: 0,
            replaying: true,
        }
    }

    /// Scans for `name` with at most one full wrap and returns the matched
    /// node, removing it (schema mode) or marking it consumed for the current
    /// item (replay mode).
    pub(crate) fn next_match(&mut self, name: &str) -> Option<Arc<SchemaNode>> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }
        let start = if self.cursor >= len { 0 } else { self.cursor };
        for step in 0..len {
            let index = (start + step) % len;
            if self.replaying && self.consumed[index] {
                continue;
            }
            if self.entries[index].name() == name {
                if self.replaying {
                    self.consumed[index] = true;
                    self.cursor = (index + 1) % len;
                    return Some(Arc::clone(&self.entries[index]));
                }
                // The removal shifts the successor into this slot, so the
                // next scan starts right after the matched entry.
                self.cursor = index;
                return Some(self.entries.remove(index));
            }
        }
        None
    }

    /// Makes every entry eligible again for the next replay item.
    pub(crate) fn rewind(&mut self) {
        for slot in &mut self.consumed {
            *slot = false;
        }
        self.cursor = 0;
    }
}

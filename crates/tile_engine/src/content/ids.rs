//! Load-scoped object id allocation

use std::collections::HashSet;

/// Hands out ids for objects that do not declare one
///
/// One allocator lives in each level-load context; a new load starts from
/// zero again. Explicit ids are reserved up front so generated ids never
/// collide with authored ones.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
    taken: HashSet<String>,
}

impl IdAllocator {
    /// Create an allocator with nothing reserved
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an authored id; returns `false` if it was already taken
    pub fn reserve(&mut self, id: &str) -> bool {
        self.taken.insert(id.to_string())
    }

    /// Next free generated id
    pub fn allocate(&mut self) -> String {
        loop {
            let candidate = format!("object_{}", self.next);
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

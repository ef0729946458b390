/// How `\d` and `\w` search when queried unanchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassScan {
    /// Scan the whole input from offset 0 and report the end relative to the
    /// query position; a match before the query position is a miss.
    #[default]
    WholeInput,
    /// Scan forward from the query position.
    FromPosition,
}

/// Tunables for one match invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Start offsets the top-level driver may try before giving up with an
    /// error.
    pub max_start_offsets: usize,
    /// Recursion depth bound. Greedy repetition and sub-pattern evaluation
    /// each add a level.
    pub max_depth: usize,
    pub class_scan: ClassScan,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_start_offsets: 100,
            max_depth: 1_000,
            class_scan: ClassScan::WholeInput,
        }
    }
}

impl MatchOptions {
    pub fn with_max_start_offsets(mut self, limit: usize) -> Self {
        self.max_start_offsets = limit;
        self
    }

    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    pub fn with_class_scan(mut self, class_scan: ClassScan) -> Self {
        self.class_scan = class_scan;
        self
    }
}

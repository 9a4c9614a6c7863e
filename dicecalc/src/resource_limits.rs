/// Resource limits that keep interactive re-evaluation bounded
///
/// The defaults are generous for real spell lists while still refusing
/// inputs that would exhaust memory or the stack.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Maximum document size in bytes
    /// Real usage: ~5KB, Limit: 5MB (1000x)
    pub max_document_bytes: usize,

    /// Maximum expression nesting depth
    /// Real usage: ~6 levels, Limit: 128
    pub max_expression_depth: usize,

    /// Expressions depending on more free names than this are never cached
    pub max_cached_dependencies: usize,

    /// Largest repetition count accepted by iterated convolution (`NdM`)
    /// Real usage: ~20 dice, Limit: 10000
    pub max_repetitions: u64,

    /// Maximum nesting of function applications during evaluation
    /// Limit: 64, low enough to stop before a 2MB thread stack runs out
    pub max_call_depth: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_document_bytes: 5 * 1024 * 1024, // 5 MB
            max_expression_depth: 128,
            max_cached_dependencies: 4,
            max_repetitions: 10_000,
            max_call_depth: 64,
        }
    }
}

impl ResourceLimits {
    /// Create a new ResourceLimits with default values
    pub fn new() -> Self {
        Self::default()
    }
}

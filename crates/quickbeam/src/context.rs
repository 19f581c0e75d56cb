//! Evaluation context configuration

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration and state for evaluation.
///
/// An interpreter holds one context for its lifetime. It controls recursion
/// limits, the expression nesting guard of the parser, an optional statement
/// budget and cooperative interruption.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Maximum call depth (stack overflow protection)
    pub max_call_depth: usize,

    /// Maximum expression nesting accepted by the parser
    pub max_expression_depth: usize,

    /// Statements one ingestion call may execute before failing
    pub max_statements: Option<u64>,

    /// Interrupt flag - set to true to abort evaluation
    pub interrupt: Arc<AtomicBool>,

    /// Whether to trace function calls (emitted at `trace` level)
    pub trace: bool,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            max_expression_depth: 128,
            max_statements: None,
            interrupt: Arc::new(AtomicBool::new(false)),
            trace: false,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            max_call_depth: max_depth,
            ..Default::default()
        }
    }

    /// Set the statement budget for each ingestion call.
    pub fn with_statement_limit(mut self, limit: u64) -> Self {
        self.max_statements = Some(limit);
        self
    }

    /// Set the expression nesting limit.
    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    /// Enable call tracing.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Check if evaluation has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Request interruption of evaluation.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Reset the interrupt flag.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctx = EvalContext::new();
        assert_eq!(ctx.max_call_depth, 256);
        assert_eq!(ctx.max_statements, None);
        assert!(!ctx.is_interrupted());
    }

    #[test]
    fn test_interrupt_is_shared_between_clones() {
        let ctx = EvalContext::new();
        let host_handle = ctx.clone();
        host_handle.interrupt();
        assert!(ctx.is_interrupted());
        ctx.reset_interrupt();
        assert!(!host_handle.is_interrupted());
    }

    #[test]
    fn test_builders() {
        let ctx = EvalContext::with_max_call_depth(8)
            .with_statement_limit(100)
            .with_max_expression_depth(4)
            .with_trace(true);
        assert_eq!(ctx.max_call_depth, 8);
        assert_eq!(ctx.max_statements, Some(100));
        assert_eq!(ctx.max_expression_depth, 4);
        assert!(ctx.trace);
    }
}

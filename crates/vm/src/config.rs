//! Runtime configuration.

/// Default bound on nested function calls, matching the deepest recursion
/// limit a program may rely on.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1_024;

/// What arithmetic does when a result does not fit its declared width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Reduce modulo 2^width. Programs guard meaningful overflow themselves.
    #[default]
    Wrap,
    /// Fail with [`RuntimeError::ArithmeticOverflow`](crate::RuntimeError::ArithmeticOverflow).
    Trap,
}

/// Knobs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Calls deeper than this fail with `StackExhausted`.
    pub max_call_depth: usize,
    pub overflow: OverflowPolicy,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            overflow: OverflowPolicy::Wrap,
        }
    }
}

impl VmConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = VmConfig::default();
        assert_eq!(config.max_call_depth, 1_024);
        assert_eq!(config.overflow, OverflowPolicy::Wrap);
    }

    #[test]
    fn builder_overrides() {
        let config = VmConfig::default()
            .with_max_call_depth(8)
            .with_overflow(OverflowPolicy::Trap);
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.overflow, OverflowPolicy::Trap);
    }
}

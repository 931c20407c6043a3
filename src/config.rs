// src/config.rs

/// Default number of operand stack slots.
pub const STACK_MAX: usize = 256;

/// Runtime limits for one VM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Operand stack capacity. Pushing past it is a runtime error.
    pub stack_max: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_max: STACK_MAX,
        }
    }
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the limit within `1..=u16::MAX`.
    pub fn with_stack_max(mut self, stack_max: usize) -> Self {
        self.stack_max = stack_max.clamp(1, u16::MAX as usize);
        self
    }
}

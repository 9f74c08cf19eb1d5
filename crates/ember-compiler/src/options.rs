//! Compiler configuration.

/// How binding call sites are mapped to cache slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingCacheScope {
    /// One slot per binding object type per unit. Every call site using the
    /// same object type shares one object, constructed by whichever call runs
    /// first; later call sites never evaluate their constructor arguments.
    #[default]
    PerType,
    /// One slot per textual call site.
    PerCallSite,
}

/// Options controlling compilation.
///
/// # Example
///
/// ```
/// use ember_compiler::{BindingCacheScope, CompilerOptions};
///
/// let options = CompilerOptions::default()
///     .with_binding_cache(BindingCacheScope::PerCallSite)
///     .with_debug_info(false);
/// assert_eq!(options.binding_cache, BindingCacheScope::PerCallSite);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Cache-slot keying for binding calls.
    pub binding_cache: BindingCacheScope,
    /// Record the source line of every emitted instruction.
    pub debug_info: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            binding_cache: BindingCacheScope::PerType,
            debug_info: true,
        }
    }
}

impl CompilerOptions {
    /// Set the cache-slot keying.
    pub fn with_binding_cache(mut self, scope: BindingCacheScope) -> Self {
        self.binding_cache = scope;
        self
    }

    /// Enable or disable line tracking.
    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.debug_info = enabled;
        self
    }
}

//! Interpreter configuration.
//!
//! Everything the interpreter recognizes by name lives here rather than
//! in the instruction handlers: foreign-bridging symbols, environment
//! queries and the init-marker function. The defaults match the symbols
//! the front-end emits; `from_env` lets a build tweak the inlining depth
//! without recompiling.

/// Default ceiling on nested inlined calls.
pub const DEFAULT_MAX_INLINE_DEPTH: usize = 64;

/// Environment variable overriding [`InterpConfig::max_inline_depth`].
pub const MAX_INLINE_DEPTH_VAR: &str = "KILN_MAX_INLINE_DEPTH";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpConfig {
    /// Maximum nesting of inlined calls before interpretation faults.
    pub max_inline_depth: usize,
    /// Name prefixes of compiler-generated foreign-function bridging
    /// globals. References to them are skipped, never interpreted.
    pub foreign_prefixes: Vec<String>,
    /// Qualified names of functions that query the process environment.
    /// Calls to them evaluate to the zero value of their result type.
    pub env_queries: Vec<String>,
    /// Name of package initializer functions. Reaching a call to one
    /// ends interpretation of the block.
    pub init_marker: String,
}

impl Default for InterpConfig {
    fn default() -> Self {
        Self {
            max_inline_depth: DEFAULT_MAX_INLINE_DEPTH,
            foreign_prefixes: vec!["__cgofn__cgo_".to_owned(), "_cgo_".to_owned()],
            env_queries: vec!["syscall.runtime_envs".to_owned()],
            init_marker: "init".to_owned(),
        }
    }
}

impl InterpConfig {
    /// Defaults, with `KILN_MAX_INLINE_DEPTH` applied when set and valid.
    pub fn from_env() -> Self {
        Self::default().with_depth_override(std::env::var(MAX_INLINE_DEPTH_VAR).ok().as_deref())
    }

    fn with_depth_override(mut self, raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().parse::<usize>()) {
            Some(Ok(depth)) => self.max_inline_depth = depth,
            Some(Err(_)) => {
                tracing::warn!(
                    var = MAX_INLINE_DEPTH_VAR,
                    value = raw.unwrap_or_default(),
                    "ignoring unparsable inline depth"
                );
            }
            None => {}
        }
        self
    }

    #[must_use]
    pub fn with_max_inline_depth(mut self, depth: usize) -> Self {
        self.max_inline_depth = depth;
        self
    }

    /// Whether a global's bare name marks a foreign-bridging artifact.
    pub fn is_foreign(&self, name: &str) -> bool {
        self.foreign_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    pub fn is_env_query(&self, qualified: &str) -> bool {
        self.env_queries.iter().any(|q| q == qualified)
    }

    pub fn is_init_marker(&self, name: &str) -> bool {
        self.init_marker == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InterpConfig::default();
        assert_eq!(config.max_inline_depth, DEFAULT_MAX_INLINE_DEPTH);
        assert!(config.is_foreign("_cgo_panic"));
        assert!(config.is_foreign("__cgofn__cgo_puts"));
        assert!(!config.is_foreign("cgo_like"));
        assert!(config.is_env_query("syscall.runtime_envs"));
        assert!(!config.is_env_query("runtime_envs"));
        assert!(config.is_init_marker("init"));
        assert!(!config.is_init_marker("init#1"));
    }

    #[test]
    fn depth_override_parses() {
        let config = InterpConfig::default().with_depth_override(Some(" 8 "));
        assert_eq!(config.max_inline_depth, 8);
    }

    #[test]
    fn depth_override_ignores_garbage() {
        let config = InterpConfig::default().with_depth_override(Some("deep"));
        assert_eq!(config.max_inline_depth, DEFAULT_MAX_INLINE_DEPTH);
        let config = InterpConfig::default().with_depth_override(None);
        assert_eq!(config.max_inline_depth, DEFAULT_MAX_INLINE_DEPTH);
    }

    #[test]
    fn builder_sets_depth() {
        assert_eq!(
            InterpConfig::default()
                .with_max_inline_depth(3)
                .max_inline_depth,
            3
        );
    }
}

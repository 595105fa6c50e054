//! Engine configuration.

/// Configuration for a [`crate::DialogueEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on consecutive condition-gated skips in one advance pass.
    ///
    /// A safety valve against authoring mistakes where every remaining
    /// dialogue is permanently gated; hitting the bound terminates the scene
    /// cleanly. Authored scenes should never legitimately approach it.
    pub max_skip_iterations: usize,
    /// RNG seed for reproducible `random` effects. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_skip_iterations: 1000,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Set the skip bound.
    pub fn with_max_skip_iterations(mut self, max: usize) -> Self {
        self.max_skip_iterations = max;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_skip_iterations, 1000);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn builder_methods() {
        let config = EngineConfig::default()
            .with_max_skip_iterations(10)
            .with_seed(42);
        assert_eq!(config.max_skip_iterations, 10);
        assert_eq!(config.seed, Some(42));
    }
}

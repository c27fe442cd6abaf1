use rand::seq::IndexedRandom;
use std::path::Path;

/// Supplies prompt texts for new rounds
pub trait PromptSource: Send + Sync {
    /// Up to `count` distinct prompts; fewer (or none) when the pool is smaller
    fn sample_prompts(&self, count: usize) -> Vec<String>;
}

/// In-memory prompt pool, usually loaded from a text file with one prompt per line
#[derive(Debug, Clone, Default)]
pub struct PromptPool {
    prompts: Vec<String>,
}

impl PromptPool {
    pub fn new(prompts: Vec<String>) -> Self {
        Self {
            prompts: prompts
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Load prompts from a file, skipping blank lines
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(content.lines().map(str::to_string).collect()))
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl PromptSource for PromptPool {
    fn sample_prompts(&self, count: usize) -> Vec<String> {
        let mut rng = rand::rng();
        self.prompts
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect()
    }
}

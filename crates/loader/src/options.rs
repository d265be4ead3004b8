use crate::error::LoadingError;
use serde::{Deserialize, Serialize};

/// Settings shared by all loaders. Unknown keys are rejected when read
/// from JSON; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderOptions {
    /// Keep whitespace-only text nodes between elements.
    pub preserve_whitespace: bool,
    /// JSON: write `json:type` and `json:name` on every element.
    pub verbose: bool,
    /// JSON: nesting depth after which values are written as empty elements.
    /// The root value is at depth 1.
    pub max_depth: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            preserve_whitespace: false,
            verbose: false,
            max_depth: 1024,
        }
    }
}

impl LoaderOptions {
    pub fn from_json(json: &str) -> Result<Self, LoadingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_preserve_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_whitespace = preserve;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

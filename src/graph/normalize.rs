use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{GraphError, GraphResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteSpec {
    pub regex: String,
    pub replace_with: String,
}

#[derive(Clone, Debug)]
struct RewriteRule {
    regex: Regex,
    replace_with: String,
}

/// Maps raw field values onto the canonical keys nodes are identified by.
///
/// Folding happens first (trim, then lower-casing when enabled), then every
/// rewrite rule is applied in order. Rewrites replace all matches.
#[derive(Clone, Debug)]
pub struct ValueNormalizer {
    trim: bool,
    fold_case: bool,
    rules: Vec<RewriteRule>,
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self {
            trim: true,
            fold_case: false,
            rules: Vec::new(),
        }
    }
}

impl ValueNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves values byte-for-byte untouched.
    pub fn identity() -> Self {
        Self {
            trim: false,
            fold_case: false,
            rules: Vec::new(),
        }
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_case_folding(mut self, fold_case: bool) -> Self {
        self.fold_case = fold_case;
        self
    }

    pub fn with_rewrite(mut self, pattern: &str, replace_with: &str) -> GraphResult<Self> {
        let regex = Regex::new(pattern).map_err(|error| GraphError::InvalidRegex {
            pattern: pattern.to_owned(),
            reason: error.to_string(),
        })?;
        self.rules.push(RewriteRule {
            regex,
            replace_with: replace_with.to_owned(),
        });
        Ok(self)
    }

    pub fn with_rewrites(self, rewrites: &[RewriteSpec]) -> GraphResult<Self> {
        rewrites.iter().try_fold(self, |normalizer, rewrite| {
            normalizer.with_rewrite(&rewrite.regex, &rewrite.replace_with)
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut value = if self.trim {
            raw.trim().to_owned()
        } else {
            raw.to_owned()
        };

        if self.fold_case {
            value = value.to_lowercase();
        }

        for rule in &self.rules {
            value = rule
                .regex
                .replace_all(&value, rule.replace_with.as_str())
                .into_owned();
        }

        value
    }
}

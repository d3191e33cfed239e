use crate::error::{LzError, Result};
use crate::token::MAX_FIELD;

/// Size of the look-behind (search) window.
pub const DEFAULT_SEARCH_CAPACITY: usize = 255;
/// Size of the lookahead window.
pub const DEFAULT_LOOKAHEAD_CAPACITY: usize = 15;
/// Shortest run reported as a back-reference.
pub const DEFAULT_MIN_MATCH_LENGTH: usize = 1;

/// Encoder tuning. The decoder reads any stream regardless of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub search_capacity: usize,
    pub lookahead_capacity: usize,
    pub min_match_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_capacity: DEFAULT_SEARCH_CAPACITY,
            lookahead_capacity: DEFAULT_LOOKAHEAD_CAPACITY,
            min_match_length: DEFAULT_MIN_MATCH_LENGTH,
        }
    }
}

impl Config {
    pub fn with_search_capacity(mut self, capacity: usize) -> Self {
        self.search_capacity = capacity;
        self
    }

    pub fn with_lookahead_capacity(mut self, capacity: usize) -> Self {
        self.lookahead_capacity = capacity;
        self
    }

    pub fn with_min_match_length(mut self, length: usize) -> Self {
        self.min_match_length = length;
        self
    }

    /// Checks that every value fits the one-byte token fields.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_FIELD).contains(&self.search_capacity) {
            return Err(LzError::InvalidConfig(format!(
                "search window must be between 1 and {} bytes, got {}",
                MAX_FIELD, self.search_capacity
            )));
        }
        if !(1..=MAX_FIELD).contains(&self.lookahead_capacity) {
            return Err(LzError::InvalidConfig(format!(
                "lookahead window must be between 1 and {} bytes, got {}",
                MAX_FIELD, self.lookahead_capacity
            )));
        }
        if self.min_match_length == 0 {
            return Err(LzError::InvalidConfig(
                "minimum match length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

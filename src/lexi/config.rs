//! Optimizer configuration.

use crate::error::{MatchError, Result};

/// Configuration for the lexicographic optimizer.
///
/// # Examples
///
/// ```
/// use u_rankmatch::lexi::LexiConfig;
///
/// let config = LexiConfig::default()
///     .with_epsilon(1e-7)
///     .with_pass_time_limit_ms(5_000)
///     .with_total_time_limit_ms(60_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LexiConfig {
    /// Tolerance when comparing a relaxation value to an integer.
    pub epsilon: f64,

    /// Time limit for each solver pass in milliseconds. `None` = unbounded.
    ///
    /// A backend that cannot be interrupted keeps solving after the limit
    /// expires; the LP backend reports such workers through
    /// [`LpRelaxationSolver::in_flight`](crate::relax::LpRelaxationSolver::in_flight).
    /// A retry with a larger limit shares the CPU with them until they finish.
    pub pass_time_limit_ms: Option<u64>,

    /// Wall-clock budget across the whole pass sequence. `None` = unbounded.
    pub total_time_limit_ms: Option<u64>,
}

impl Default for LexiConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            pass_time_limit_ms: None,
            total_time_limit_ms: None,
        }
    }
}

impl LexiConfig {
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_pass_time_limit_ms(mut self, ms: u64) -> Self {
        self.pass_time_limit_ms = Some(ms);
        self
    }

    pub fn with_total_time_limit_ms(mut self, ms: u64) -> Self {
        self.total_time_limit_ms = Some(ms);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon < 0.5) {
            return Err(MatchError::InvalidConfig(format!(
                "epsilon must be in (0, 0.5), got {}",
                self.epsilon
            )));
        }
        if self.pass_time_limit_ms == Some(0) {
            return Err(MatchError::InvalidConfig(
                "pass_time_limit_ms must be positive".into(),
            ));
        }
        if self.total_time_limit_ms == Some(0) {
            return Err(MatchError::InvalidConfig(
                "total_time_limit_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LexiConfig::default();
        assert!((config.epsilon - 1e-6).abs() < 1e-15);
        assert_eq!(config.pass_time_limit_ms, None);
        assert_eq!(config.total_time_limit_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_epsilon() {
        assert!(LexiConfig::default().with_epsilon(0.0).validate().is_err());
        assert!(LexiConfig::default().with_epsilon(0.5).validate().is_err());
        assert!(LexiConfig::default()
            .with_epsilon(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_zero_limits() {
        assert!(LexiConfig::default()
            .with_pass_time_limit_ms(0)
            .validate()
            .is_err());
        assert!(LexiConfig::default()
            .with_total_time_limit_ms(0)
            .validate()
            .is_err());
    }
}

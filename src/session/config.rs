//! Configuration reducer
//!
//! Unconfigured -> Submitting on submit, Submitting -> Configured on
//! CONFIG_SUCCESS, Submitting -> Unconfigured on CONFIG_ERROR. Configuration
//! is accepted or rejected wholesale, never partially applied.

use crate::session::store::Advisory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigPhase {
    #[default]
    Unconfigured,
    Submitting,
    Configured,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSlice {
    phase: ConfigPhase,
}

impl ConfigSlice {
    pub fn phase(&self) -> ConfigPhase {
        self.phase
    }

    /// Dispatcher-issued SUBMIT_CONFIG.
    pub fn begin_submit(&mut self) {
        self.phase = ConfigPhase::Submitting;
    }

    pub fn on_success(&mut self) -> Option<Advisory> {
        self.phase = ConfigPhase::Configured;
        Some(Advisory::normal("Configuration accepted"))
    }

    pub fn on_error(&mut self, message: &str) -> Option<Advisory> {
        self.phase = ConfigPhase::Unconfigured;
        Some(Advisory::error(format!("Configuration Error: {message}")))
    }

    /// Session reset forces Unconfigured unconditionally.
    pub fn reset(&mut self) {
        self.phase = ConfigPhase::Unconfigured;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_while_submitting_returns_to_unconfigured() {
        let mut slice = ConfigSlice::default();
        slice.begin_submit();
        assert_eq!(slice.phase(), ConfigPhase::Submitting);
        let advisory = slice.on_error("no repos").unwrap();
        assert_eq!(slice.phase(), ConfigPhase::Unconfigured);
        assert_eq!(advisory.text, "Configuration Error: no repos");
    }

    #[test]
    fn reset_drops_configured_state() {
        let mut slice = ConfigSlice::default();
        slice.begin_submit();
        slice.on_success();
        assert_eq!(slice.phase(), ConfigPhase::Configured);
        slice.reset();
        assert_eq!(slice.phase(), ConfigPhase::Unconfigured);
    }
}

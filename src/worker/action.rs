//! Lifecycle actions accepted from the control surface

use std::fmt;

/// Closed set of unit actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    /// Whether a job mode applies to this action
    pub fn takes_mode(&self) -> bool {
        matches!(self, Self::Start | Self::Stop | Self::Restart)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of dispatching an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The service manager accepted the call
    Done,
    /// The call was issued and failed
    Failed,
    /// Unit not tracked; no call was issued
    Skipped,
}

impl From<bool> for ActionOutcome {
    fn from(ok: bool) -> Self {
        if ok {
            Self::Done
        } else {
            Self::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takes_mode() {
        assert!(Action::Start.takes_mode());
        assert!(Action::Restart.takes_mode());
        assert!(!Action::Enable.takes_mode());
        assert!(!Action::Disable.takes_mode());
    }

    #[test]
    fn test_outcome_from_bool() {
        assert_eq!(ActionOutcome::from(true), ActionOutcome::Done);
        assert_eq!(ActionOutcome::from(false), ActionOutcome::Failed);
    }
}

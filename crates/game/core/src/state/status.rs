use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Lifecycle status of a running session, as seen by its runner.
///
/// ```text
/// initializing -> active -> { won | lost | error } -> ended
///              \-> error -> ended
/// ```
///
/// `ended` is terminal and always reached. The three outcomes are only set by
/// the rules (won, lost) or by the runner when the rules fail (error).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Initializing,
    Active,
    Won,
    Lost,
    Error,
    Ended,
}

impl RunStatus {
    /// True for the outcomes that halt the tick loop.
    pub const fn is_outcome(self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Error)
    }

    /// True once the session can no longer advance.
    pub const fn is_terminal(self) -> bool {
        self.is_outcome() || matches!(self, Self::Ended)
    }

    /// Whether moving from `self` to `next` respects the lifecycle ordering.
    ///
    /// Staying on the same status is allowed so that repeated writes are
    /// harmless.
    pub const fn can_transition_to(self, next: Self) -> bool {
        use RunStatus::*;

        matches!(
            (self, next),
            (Initializing, Initializing | Active | Error | Ended)
                | (Active, Active | Won | Lost | Error | Ended)
                | (Won, Won | Ended)
                | (Lost, Lost | Ended)
                | (Error, Error | Ended)
                | (Ended, Ended)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn outcomes_lead_only_to_ended() {
        for outcome in [RunStatus::Won, RunStatus::Lost, RunStatus::Error] {
            assert!(outcome.is_outcome());
            assert!(outcome.can_transition_to(RunStatus::Ended));
            assert!(!outcome.can_transition_to(RunStatus::Active));
            assert!(!RunStatus::Ended.can_transition_to(outcome));
        }
    }

    #[test]
    fn initialization_failure_skips_active() {
        assert!(RunStatus::Initializing.can_transition_to(RunStatus::Error));
        assert!(!RunStatus::Initializing.can_transition_to(RunStatus::Won));
    }

    #[test]
    fn string_forms_are_snake_case() {
        assert_eq!(RunStatus::Initializing.to_string(), "initializing");
        assert_eq!(RunStatus::from_str("lost").unwrap(), RunStatus::Lost);
        assert_eq!(
            serde_json::to_string(&RunStatus::Won).unwrap(),
            "\"won\""
        );
    }
}

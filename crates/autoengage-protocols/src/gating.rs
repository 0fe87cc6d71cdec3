//! Action gating: decide what to do with a loaded page before touching it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the actuator observed on the loaded page before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageObservation {
    /// The post is already liked by this account.
    pub is_liked: bool,
    /// This account already commented on the post.
    pub has_commented: bool,
}

/// Why a URL was skipped without performing any action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Both actions are disabled in the settings.
    NoActionsEnabled,
    /// Every enabled action has already been applied.
    AlreadyProcessed,
    /// Post is liked and commenting is disabled.
    AlreadyLikedCommentingDisabled,
    /// Post is commented and liking is disabled.
    AlreadyCommentedLikingDisabled,
    /// No enabled action remains applicable.
    ConditionsNotMet,
}

impl SkipReason {
    /// Stable string form as carried in logs and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoActionsEnabled => "no_actions_enabled",
            SkipReason::AlreadyProcessed => "already_processed",
            SkipReason::AlreadyLikedCommentingDisabled => "already_liked_commenting_disabled",
            SkipReason::AlreadyCommentedLikingDisabled => "already_commented_liking_disabled",
            SkipReason::ConditionsNotMet => "conditions_not_met",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of gating: either perform some subset of actions, or skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPlan {
    /// Perform the listed actions. At least one flag is true.
    Perform {
        /// Apply a like.
        attempt_like: bool,
        /// Post a comment.
        attempt_comment: bool,
    },
    /// Do nothing and record the reason.
    Skip(SkipReason),
}

impl ActionPlan {
    /// Gate enabled actions against what the page already shows.
    ///
    /// An action is attempted only when it is enabled and its effect is not
    /// already present, which keeps repeat visits to the same URL from
    /// double-applying anything.
    pub fn decide(
        enable_like: bool,
        enable_comment: bool,
        observation: PageObservation,
    ) -> ActionPlan {
        let attempt_like = enable_like && !observation.is_liked;
        let attempt_comment = enable_comment && !observation.has_commented;

        if attempt_like || attempt_comment {
            return ActionPlan::Perform {
                attempt_like,
                attempt_comment,
            };
        }

        let reason = match (
            enable_like,
            enable_comment,
            observation.is_liked,
            observation.has_commented,
        ) {
            (false, false, _, _) => SkipReason::NoActionsEnabled,
            (true, true, true, true) => SkipReason::AlreadyProcessed,
            (true, false, true, _) => SkipReason::AlreadyLikedCommentingDisabled,
            (false, true, _, true) => SkipReason::AlreadyCommentedLikingDisabled,
            _ => SkipReason::ConditionsNotMet,
        };
        ActionPlan::Skip(reason)
    }
}

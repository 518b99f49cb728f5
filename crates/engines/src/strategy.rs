//! Setup strategies.
//!
//! A setup strategy is a named policy governing whether a container image is
//! built, pulled, or pushed before execution. Resolving a strategy against
//! "does the image already exist locally" yields an ordered plan of steps;
//! each step may carry a fallback action attempted when the primary one
//! fails. Plans are idempotent: existence checks come first for every
//! `ifneedbe*` policy, so re-running setup on every invocation is safe.

use capsule_core::{Error, Result};
use std::fmt;

/// Named image-setup policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStrategy {
    /// Always rebuild without cache
    AlwaysBuild,
    /// Always rebuild using the builder cache
    AlwaysCachedBuild,
    /// Build without cache only when the image is absent
    IfNeedBeBuild,
    /// Build with cache only when the image is absent
    IfNeedBeCachedBuild,
    /// Always pull
    AlwaysPull,
    /// Always pull, build without cache when the pull fails
    AlwaysPullElseBuild,
    /// Always pull, build with cache when the pull fails
    AlwaysPullElseCachedBuild,
    /// Pull only when the image is absent
    IfNeedBePull,
    /// Pull when absent, build without cache when the pull fails
    IfNeedBePullElseBuild,
    /// Pull when absent, build with cache when the pull fails
    IfNeedBePullElseCachedBuild,
    /// Push the image to its registry
    Push,
    /// Push only when the registry does not already have the image
    PushIfNotPresent,
    /// Perform no setup at all
    DoNothing,
}

impl SetupStrategy {
    /// All strategies, in table order.
    pub const ALL: [Self; 13] = [
        Self::AlwaysBuild,
        Self::AlwaysCachedBuild,
        Self::IfNeedBeBuild,
        Self::IfNeedBeCachedBuild,
        Self::AlwaysPull,
        Self::AlwaysPullElseBuild,
        Self::AlwaysPullElseCachedBuild,
        Self::IfNeedBePull,
        Self::IfNeedBePullElseBuild,
        Self::IfNeedBePullElseCachedBuild,
        Self::Push,
        Self::PushIfNotPresent,
        Self::DoNothing,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AlwaysBuild => "alwaysbuild",
            Self::AlwaysCachedBuild => "alwayscachedbuild",
            Self::IfNeedBeBuild => "ifneedbebuild",
            Self::IfNeedBeCachedBuild => "ifneedbecachedbuild",
            Self::AlwaysPull => "alwayspull",
            Self::AlwaysPullElseBuild => "alwayspullelsebuild",
            Self::AlwaysPullElseCachedBuild => "alwayspullelsecachedbuild",
            Self::IfNeedBePull => "ifneedbepull",
            Self::IfNeedBePullElseBuild => "ifneedbepullelsebuild",
            Self::IfNeedBePullElseCachedBuild => "ifneedbepullelsecachedbuild",
            Self::Push => "push",
            Self::PushIfNotPresent => "pushifnotpresent",
            Self::DoNothing => "donothing",
        }
    }

    /// Parse a strategy name, ignoring case and `-`/`_` separators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStrategy`] naming the component when the name
    /// matches no strategy.
    pub fn parse(name: &str, component: &str) -> Result<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name() == normalized)
            .ok_or_else(|| Error::UnknownStrategy {
                strategy: name.to_string(),
                component: component.to_string(),
            })
    }
}

impl fmt::Display for SetupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single image-setup action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    /// Build the image from its definition
    Build {
        /// Use the builder cache
        cached: bool,
    },
    /// Pull the image from its registry
    Pull,
    /// Push the image to its registry
    Push,
    /// Push only when the registry does not already have the image
    PushIfAbsent,
}

impl fmt::Display for SetupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build { cached: true } => f.write_str("build (cached)"),
            Self::Build { cached: false } => f.write_str("build"),
            Self::Pull => f.write_str("pull"),
            Self::Push => f.write_str("push"),
            Self::PushIfAbsent => f.write_str("push if absent"),
        }
    }
}

/// One step of a setup plan: a primary action plus an optional fallback
/// attempted when the primary one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupStep {
    /// The action attempted first
    pub action: SetupAction,
    /// Attempted when `action` fails; its result decides the outcome
    pub fallback: Option<SetupAction>,
}

impl SetupStep {
    fn of(action: SetupAction) -> Self {
        Self {
            action,
            fallback: None,
        }
    }

    fn with_fallback(action: SetupAction, fallback: SetupAction) -> Self {
        Self {
            action,
            fallback: Some(fallback),
        }
    }
}

/// Resolve a strategy for a Docker-family engine into an ordered plan.
#[must_use]
pub fn docker_plan(strategy: SetupStrategy, exists_locally: bool) -> Vec<SetupStep> {
    use SetupAction::{Build, Pull, Push, PushIfAbsent};
    match strategy {
        SetupStrategy::AlwaysBuild => vec![SetupStep::of(Build { cached: false })],
        SetupStrategy::AlwaysCachedBuild => vec![SetupStep::of(Build { cached: true })],
        SetupStrategy::IfNeedBeBuild if exists_locally => Vec::new(),
        SetupStrategy::IfNeedBeBuild => vec![SetupStep::of(Build { cached: false })],
        SetupStrategy::IfNeedBeCachedBuild if exists_locally => Vec::new(),
        SetupStrategy::IfNeedBeCachedBuild => vec![SetupStep::of(Build { cached: true })],
        SetupStrategy::AlwaysPull => vec![SetupStep::of(Pull)],
        SetupStrategy::AlwaysPullElseBuild => {
            vec![SetupStep::with_fallback(Pull, Build { cached: false })]
        }
        SetupStrategy::AlwaysPullElseCachedBuild => {
            vec![SetupStep::with_fallback(Pull, Build { cached: true })]
        }
        SetupStrategy::IfNeedBePull if exists_locally => Vec::new(),
        SetupStrategy::IfNeedBePull => vec![SetupStep::of(Pull)],
        SetupStrategy::IfNeedBePullElseBuild if exists_locally => Vec::new(),
        SetupStrategy::IfNeedBePullElseBuild => {
            vec![SetupStep::with_fallback(Pull, Build { cached: false })]
        }
        SetupStrategy::IfNeedBePullElseCachedBuild if exists_locally => Vec::new(),
        SetupStrategy::IfNeedBePullElseCachedBuild => {
            vec![SetupStep::with_fallback(Pull, Build { cached: true })]
        }
        SetupStrategy::Push => vec![SetupStep::of(Push)],
        SetupStrategy::PushIfNotPresent => vec![SetupStep::of(PushIfAbsent)],
        SetupStrategy::DoNothing => Vec::new(),
    }
}

/// Resolve a strategy for an Apptainer engine into an ordered plan.
///
/// The apptainer family mirrors the build/pull/pull-else-build shapes only.
/// An Apptainer image is one immutable file, so there is no cache
/// distinction: `*cachedbuild` names resolve to the same plan as their
/// uncached forms. Push-family strategies have no apptainer counterpart.
///
/// # Errors
///
/// Returns [`Error::UnknownStrategy`] for push-family strategies.
pub fn apptainer_plan(
    strategy: SetupStrategy,
    exists_locally: bool,
    component: &str,
) -> Result<Vec<SetupStep>> {
    use SetupAction::{Build, Pull};
    let plan = match strategy {
        SetupStrategy::AlwaysBuild | SetupStrategy::AlwaysCachedBuild => {
            vec![SetupStep::of(Build { cached: false })]
        }
        SetupStrategy::IfNeedBeBuild | SetupStrategy::IfNeedBeCachedBuild => {
            if exists_locally {
                Vec::new()
            } else {
                vec![SetupStep::of(Build { cached: false })]
            }
        }
        SetupStrategy::AlwaysPull => vec![SetupStep::of(Pull)],
        SetupStrategy::AlwaysPullElseBuild | SetupStrategy::AlwaysPullElseCachedBuild => {
            vec![SetupStep::with_fallback(Pull, Build { cached: false })]
        }
        SetupStrategy::IfNeedBePull => {
            if exists_locally {
                Vec::new()
            } else {
                vec![SetupStep::of(Pull)]
            }
        }
        SetupStrategy::IfNeedBePullElseBuild | SetupStrategy::IfNeedBePullElseCachedBuild => {
            if exists_locally {
                Vec::new()
            } else {
                vec![SetupStep::with_fallback(Pull, Build { cached: false })]
            }
        }
        SetupStrategy::DoNothing => Vec::new(),
        SetupStrategy::Push | SetupStrategy::PushIfNotPresent => {
            return Err(Error::UnknownStrategy {
                strategy: strategy.name().to_string(),
                component: component.to_string(),
            });
        }
    };
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_case_and_separators() {
        assert_eq!(
            SetupStrategy::parse("ifneedbe_pull_else_build", "c").unwrap(),
            SetupStrategy::IfNeedBePullElseBuild
        );
        assert_eq!(
            SetupStrategy::parse("AlwaysCachedBuild", "c").unwrap(),
            SetupStrategy::AlwaysCachedBuild
        );
        assert_eq!(
            SetupStrategy::parse("pull-if-needbe", "c").unwrap_err().to_string(),
            "Unknown setup strategy 'pull-if-needbe' in component 'c'"
        );
    }

    #[test]
    fn ifneedbe_policies_check_existence_first() {
        assert!(docker_plan(SetupStrategy::IfNeedBeBuild, true).is_empty());
        assert_eq!(
            docker_plan(SetupStrategy::IfNeedBeBuild, false),
            vec![SetupStep::of(SetupAction::Build { cached: false })]
        );
        assert!(docker_plan(SetupStrategy::IfNeedBePull, true).is_empty());
    }

    #[test]
    fn pull_else_build_falls_back_to_build() {
        let plan = docker_plan(SetupStrategy::IfNeedBePullElseBuild, false);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].action, SetupAction::Pull);
        assert_eq!(plan[0].fallback, Some(SetupAction::Build { cached: false }));

        // Once the image exists, re-running the same policy is a no-op.
        assert!(docker_plan(SetupStrategy::IfNeedBePullElseBuild, true).is_empty());
    }

    #[test]
    fn always_policies_ignore_existence() {
        for exists in [true, false] {
            assert_eq!(
                docker_plan(SetupStrategy::AlwaysBuild, exists),
                vec![SetupStep::of(SetupAction::Build { cached: false })]
            );
            assert_eq!(
                docker_plan(SetupStrategy::AlwaysPullElseCachedBuild, exists),
                vec![SetupStep::with_fallback(
                    SetupAction::Pull,
                    SetupAction::Build { cached: true }
                )]
            );
        }
    }

    #[test]
    fn push_strategies_map_to_push_actions() {
        assert_eq!(
            docker_plan(SetupStrategy::Push, true),
            vec![SetupStep::of(SetupAction::Push)]
        );
        assert_eq!(
            docker_plan(SetupStrategy::PushIfNotPresent, false),
            vec![SetupStep::of(SetupAction::PushIfAbsent)]
        );
    }

    #[test]
    fn apptainer_has_no_cache_distinction_and_no_push() {
        assert_eq!(
            apptainer_plan(SetupStrategy::AlwaysCachedBuild, false, "c").unwrap(),
            vec![SetupStep::of(SetupAction::Build { cached: false })]
        );
        let err = apptainer_plan(SetupStrategy::Push, false, "c").unwrap_err();
        assert!(matches!(err, Error::UnknownStrategy { .. }));
    }
}

//! Round-robin fixpoint scheduling of rewrite passes.
//!
//! One round applies every scheduled pass once, in order. Rounds repeat until
//! a whole round reports no change. The optimize procedure runs two such
//! fixpoints around a structural one-shot pass, because that pass can expose
//! simplifications the first fixpoint had already exhausted, and finishes
//! with a second one-shot cleanup pass.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info};

use crate::config::OptimizeConfig;
use crate::{AppError, Result};

/// Boxed future returned by [`PassRunner::run_pass`].
pub type PassFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

/// Anything that can apply a named pass and report whether it changed the
/// program.
pub trait PassRunner: Send {
    /// Apply pass `name`; with `fixpoint` the engine repeats it until it
    /// stops changing the program.
    fn run_pass<'a>(&'a mut self, name: &'a str, fixpoint: bool) -> PassFuture<'a>;
}

/// One entry of a fixpoint round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStep {
    /// Pass name understood by the engine.
    pub name: String,
    /// Whether the engine should repeat the pass to local convergence.
    pub fixpoint: bool,
}

impl PassStep {
    /// Construct a step.
    #[must_use]
    pub fn new(name: impl Into<String>, fixpoint: bool) -> Self {
        Self {
            name: name.into(),
            fixpoint,
        }
    }
}

/// Full optimize schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizePlan {
    /// Passes of one fixpoint round, in order.
    pub round: Vec<PassStep>,
    /// One-shot pass between the two fixpoint phases.
    pub intermediate: String,
    /// One-shot pass after the second fixpoint phase.
    pub finish: String,
    /// Round limit per fixpoint phase; `None` loops until convergence.
    pub max_rounds: Option<u32>,
}

impl OptimizePlan {
    /// Build the plan described by `[optimize]`.
    #[must_use]
    pub fn from_config(config: &OptimizeConfig) -> Self {
        let round = config
            .passes
            .iter()
            .map(|name| PassStep::new(name, config.fixpoint_passes.contains(name)))
            .collect();
        Self {
            round,
            intermediate: config.intermediate_pass.clone(),
            finish: config.final_pass.clone(),
            max_rounds: config.max_rounds,
        }
    }
}

impl Default for OptimizePlan {
    fn default() -> Self {
        Self::from_config(&OptimizeConfig::default())
    }
}

/// Outcome of one fixpoint phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixpointReport {
    /// Rounds executed, including the final quiet round.
    pub rounds: u32,
    /// Pass applications that reported a change.
    pub changes: u32,
}

/// Outcome of a full optimize run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    /// First fixpoint phase.
    pub first: FixpointReport,
    /// Whether the intermediate one-shot pass changed the program.
    pub intermediate_changed: bool,
    /// Second fixpoint phase.
    pub second: FixpointReport,
    /// Whether the final one-shot pass changed the program.
    pub finish_changed: bool,
}

/// Repeat `steps` in rounds until a round reports no change.
///
/// # Errors
///
/// - Any pass error aborts immediately and is returned unchanged.
/// - [`AppError::Convergence`] when `max_rounds` rounds all reported change.
pub async fn run_to_fixpoint<R>(
    runner: &mut R,
    steps: &[PassStep],
    max_rounds: Option<u32>,
) -> Result<FixpointReport>
where
    R: PassRunner + ?Sized,
{
    let mut report = FixpointReport::default();

    loop {
        if max_rounds.is_some_and(|max| report.rounds >= max) {
            return Err(AppError::Convergence(format!(
                "passes still changing the program after {} rounds",
                report.rounds
            )));
        }
        report.rounds += 1;

        let mut any_change = false;
        for step in steps {
            debug!(pass = step.name, round = report.rounds, "running pass");
            let changed = runner.run_pass(&step.name, step.fixpoint).await?;
            debug!(pass = step.name, round = report.rounds, changed, "finished pass");
            if changed {
                report.changes += 1;
                any_change = true;
            }
        }

        if !any_change {
            return Ok(report);
        }
    }
}

/// Run the two-phase optimize schedule: fixpoint, intermediate pass,
/// fixpoint again, final pass.
///
/// # Errors
///
/// Propagates the first pass or convergence error; later phases do not run.
pub async fn run_plan<R>(runner: &mut R, plan: &OptimizePlan) -> Result<OptimizeReport>
where
    R: PassRunner + ?Sized,
{
    let first = run_to_fixpoint(runner, &plan.round, plan.max_rounds).await?;
    let intermediate_changed = runner.run_pass(&plan.intermediate, false).await?;
    let second = run_to_fixpoint(runner, &plan.round, plan.max_rounds).await?;
    let finish_changed = runner.run_pass(&plan.finish, false).await?;

    let report = OptimizeReport {
        first,
        intermediate_changed,
        second,
        finish_changed,
    };
    info!(
        first_rounds = first.rounds,
        second_rounds = second.rounds,
        changes = first.changes + second.changes,
        "optimize schedule converged"
    );
    Ok(report)
}

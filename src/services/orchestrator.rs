// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::delay::sleep_range;
use crate::common::error::AppError;
use crate::domain::account::Account;
use crate::infrastructure::data::registry::AccountRegistry;
use crate::infrastructure::network::ip_rotation::ProxyRotator;
use crate::services::workflow::{Selection, StepOutcome, Workflow, WorkflowContext};
use std::sync::Arc;

/// Counters for one orchestrated run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub selections: usize,
    pub steps: usize,
    pub stalls: usize,
    pub finished: usize,
}

/// Drives one workflow over the registry until no account is eligible.
pub struct Orchestrator {
    ctx: WorkflowContext,
    rotator: Arc<dyn ProxyRotator>,
    max_selections: Option<usize>,
}

impl Orchestrator {
    pub fn new(ctx: WorkflowContext, rotator: Arc<dyn ProxyRotator>) -> Self {
        Self {
            ctx,
            rotator,
            max_selections: None,
        }
    }

    /// Stop after `n` account selections even if work remains.
    pub fn with_max_selections(mut self, n: usize) -> Self {
        self.max_selections = Some(n);
        self
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    fn next_account(&self, registry: &AccountRegistry, workflow: &dyn Workflow) -> Option<usize> {
        let eligible = |a: &Account| workflow.eligible(a);
        match workflow.selection() {
            Selection::Random => {
                let mut rng = rand::thread_rng();
                registry.select(&mut rng, eligible).map(|(i, _)| i)
            }
            Selection::First => registry.select_first(eligible).map(|(i, _)| i),
        }
    }

    pub async fn run(
        &self,
        registry: &mut AccountRegistry,
        workflow: &dyn Workflow,
    ) -> Result<RunSummary, AppError> {
        workflow.preflight(&self.ctx, registry)?;
        let settings = &self.ctx.settings;
        let mut summary = RunSummary::default();
        tracing::info!(
            target: "orchestrator",
            workflow = workflow.name(),
            accounts = registry.len(),
            "Starting run"
        );

        loop {
            if self.max_selections.is_some_and(|max| summary.selections >= max) {
                tracing::info!(target: "orchestrator", workflow = workflow.name(), "Selection limit reached");
                break;
            }
            if settings.use_mobile_proxy {
                self.rotator.rotate().await;
            }
            let Some(index) = self.next_account(registry, workflow) else {
                break;
            };
            summary.selections += 1;

            loop {
                match workflow.step(&self.ctx, registry, index).await {
                    Ok(StepOutcome::Advanced) => {
                        summary.steps += 1;
                        if !workflow.drives_to_completion() {
                            break;
                        }
                        sleep_range(settings.tx_delay_range).await;
                    }
                    Ok(StepOutcome::Finished) => {
                        summary.steps += 1;
                        summary.finished += 1;
                        break;
                    }
                    Ok(StepOutcome::Stalled) => {
                        summary.stalls += 1;
                        tracing::warn!(
                            target: "orchestrator",
                            workflow = workflow.name(),
                            index,
                            "Step stalled; account stays eligible"
                        );
                        break;
                    }
                    Err(e) if e.is_fatal() => {
                        tracing::error!(
                            target: "orchestrator",
                            workflow = workflow.name(),
                            index,
                            error = %e,
                            "Fatal error; aborting run"
                        );
                        return Err(e);
                    }
                    Err(e) => {
                        summary.stalls += 1;
                        tracing::warn!(
                            target: "orchestrator",
                            workflow = workflow.name(),
                            index,
                            error = %e,
                            "Step failed; account stays eligible"
                        );
                        break;
                    }
                }
            }

            if registry.any(|a| workflow.eligible(a)) {
                sleep_range(settings.wallet_delay_range).await;
            }
        }

        tracing::info!(
            target: "orchestrator",
            notify = true,
            workflow = workflow.name(),
            selections = summary.selections,
            steps = summary.steps,
            stalls = summary.stalls,
            finished = summary.finished,
            "Run complete"
        );
        Ok(summary)
    }
}

/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::cost::CardinalityEstimator;
use super::operators::LogicalOperator;
use super::rules::{JoinFusion, JoinReorder, ProjectionPushdown, RewritePass, SelectionPushdown};
use super::types::OptimizerConfig;
use super::utils::annotated;
use crate::custom_error::PlanError;
use log::debug;

/// Heuristic optimiser running a fixed sequence of rewrite passes
#[derive(Debug, Clone, Default)]
pub struct Optimiser {
    pub config: OptimizerConfig,
    estimator: CardinalityEstimator,
}

impl Optimiser {
    /// Creates a new optimiser with every pass enabled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OptimizerConfig) -> Self {
        Self {
            config,
            estimator: CardinalityEstimator::new(),
        }
    }

    pub fn estimator(&self) -> &CardinalityEstimator {
        &self.estimator
    }

    /// Rewrites `plan` into a cheaper plan producing the same attributes.
    ///
    /// The input plan is estimated first, which annotates it and rejects
    /// dangling attribute references. The returned plan is a new tree with
    /// every node estimated.
    pub fn optimise(&self, plan: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        let initial_cost = self.estimator.plan_cost(plan)?;
        debug!("optimising {} (cost {})", plan, initial_cost);

        let mut current = annotated(&self.estimator, plan.detached())?;
        for pass in self.passes() {
            current = pass.apply(&current)?;
            debug!(
                "after {}: {} (cost {})",
                pass.name(),
                current,
                self.estimator.plan_cost(&current)?
            );
        }
        Ok(current)
    }

    fn passes(&self) -> Vec<Box<dyn RewritePass + '_>> {
        let mut passes: Vec<Box<dyn RewritePass + '_>> = Vec::new();
        if self.config.push_down_selections {
            passes.push(Box::new(SelectionPushdown::new(&self.estimator)));
        }
        if self.config.reorder_joins {
            passes.push(Box::new(JoinReorder::new(&self.estimator)));
        }
        if self.config.fuse_joins {
            passes.push(Box::new(JoinFusion::new(&self.estimator)));
        }
        if self.config.push_down_projections {
            passes.push(Box::new(ProjectionPushdown::new(&self.estimator)));
        }
        passes
    }
}

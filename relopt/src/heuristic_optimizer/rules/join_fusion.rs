/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::RewritePass;
use crate::custom_error::PlanError;
use crate::heuristic_optimizer::cost::CardinalityEstimator;
use crate::heuristic_optimizer::operators::{LogicalOperator, OperatorKind};
use crate::heuristic_optimizer::utils::annotated;
use log::trace;
use shared::Predicate;

/// Turns a selection comparing two attributes directly over a product into a join
pub struct JoinFusion<'e> {
    estimator: &'e CardinalityEstimator,
}

impl<'e> JoinFusion<'e> {
    pub fn new(estimator: &'e CardinalityEstimator) -> Self {
        Self { estimator }
    }

    fn accept(&self, op: LogicalOperator) -> Result<LogicalOperator, PlanError> {
        annotated(self.estimator, op)
    }

    fn fuse(&self, op: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        match op.kind() {
            OperatorKind::Scan { .. } => self.accept(op.detached()),
            OperatorKind::Select { input, predicate } => {
                let input = self.fuse(input)?;
                if predicate.equals_value() {
                    return self.accept(LogicalOperator::select(input, predicate.clone()));
                }
                match input.into_product_inputs() {
                    Ok((left, right)) => self.fuse_product(left, right, predicate),
                    Err(input) => self.accept(LogicalOperator::select(input, predicate.clone())),
                }
            }
            OperatorKind::Project { input, attributes } => {
                let input = self.fuse(input)?;
                self.accept(LogicalOperator::project(input, attributes.clone()))
            }
            OperatorKind::Product { left, right } => {
                let left = self.fuse(left)?;
                let right = self.fuse(right)?;
                self.accept(LogicalOperator::product(left, right))
            }
            OperatorKind::Join {
                left,
                right,
                predicate,
            } => {
                let left = self.fuse(left)?;
                let right = self.fuse(right)?;
                self.accept(LogicalOperator::join(left, right, predicate.clone()))
            }
        }
    }

    fn fuse_product(
        &self,
        left: LogicalOperator,
        right: LogicalOperator,
        predicate: &Predicate,
    ) -> Result<LogicalOperator, PlanError> {
        let first = predicate.left_attribute();
        let Some(second) = predicate.right_attribute() else {
            return Err(PlanError::NonEquiJoin(predicate.to_string()));
        };

        let (left_out, right_out) = (left.output()?, right.output()?);
        let oriented = if left_out.contains(first) && right_out.contains(second) {
            Some(predicate.clone())
        } else if left_out.contains(second) && right_out.contains(first) {
            Some(predicate.flipped())
        } else {
            None
        };

        match oriented {
            Some(join_predicate) => {
                trace!("fusing {} into a join", join_predicate);
                self.accept(LogicalOperator::join(left, right, join_predicate))
            }
            None => {
                let product = self.accept(LogicalOperator::product(left, right))?;
                self.accept(LogicalOperator::select(product, predicate.clone()))
            }
        }
    }
}

impl RewritePass for JoinFusion<'_> {
    fn name(&self) -> &'static str {
        "join fusion"
    }

    fn apply(&self, plan: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        self.fuse(plan)
    }
}

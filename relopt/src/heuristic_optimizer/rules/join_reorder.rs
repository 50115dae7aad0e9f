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

/// Rebuilds every product region as a left-deep chain, smallest input first.
///
/// A product region is a connected group of Product nodes and the selections
/// sitting on them. Its operands are the filtered scans and the projections
/// or joins hanging off the region; the latter are reordered on their own.
/// Detached predicates are reattached as soon as the chain exposes all of
/// their attributes.
pub struct JoinReorder<'e> {
    estimator: &'e CardinalityEstimator,
}

/// Working state for one product region
#[derive(Default)]
struct Region {
    operands: Vec<LogicalOperator>,
    predicates: Vec<Predicate>,
}

impl<'e> JoinReorder<'e> {
    pub fn new(estimator: &'e CardinalityEstimator) -> Self {
        Self { estimator }
    }

    fn accept(&self, op: LogicalOperator) -> Result<LogicalOperator, PlanError> {
        annotated(self.estimator, op)
    }

    fn reorder(&self, op: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        if op.is_filtered_scan() {
            return self.accept(op.detached());
        }

        match op.kind() {
            OperatorKind::Project { input, attributes } => {
                let input = self.reorder(input)?;
                self.accept(LogicalOperator::project(input, attributes.clone()))
            }
            OperatorKind::Join {
                left,
                right,
                predicate,
            } => {
                let left = self.reorder(left)?;
                let right = self.reorder(right)?;
                self.accept(LogicalOperator::join(left, right, predicate.clone()))
            }
            _ => self.reorder_region(op),
        }
    }

    fn reorder_region(&self, op: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        let mut region = Region::default();
        self.collect(op, &mut region)?;

        let mut keyed = Vec::with_capacity(region.operands.len());
        for operand in region.operands {
            let tuples = operand.output()?.tuple_count();
            keyed.push((tuples, operand));
        }
        keyed.sort_by_key(|(tuples, _)| *tuples);

        let mut pending = region.predicates;
        let mut operands = keyed.into_iter().map(|(_, operand)| operand);
        let Some(first) = operands.next() else {
            return self.accept(op.detached());
        };

        let mut chain = self.attach_ready(first, &mut pending)?;
        for operand in operands {
            chain = self.accept(LogicalOperator::product(chain, operand))?;
            chain = self.attach_ready(chain, &mut pending)?;
        }

        if let Some(predicate) = pending.first() {
            return Err(PlanError::PredicateUnsatisfiable(predicate.to_string()));
        }
        trace!("reordered region into {}", chain);
        Ok(chain)
    }

    /// Gathers operands and predicates of the region rooted at `op`, innermost predicate first
    fn collect(&self, op: &LogicalOperator, region: &mut Region) -> Result<(), PlanError> {
        if op.is_filtered_scan() {
            region.operands.push(self.accept(op.detached())?);
            return Ok(());
        }

        match op.kind() {
            OperatorKind::Product { left, right } => {
                self.collect(left, region)?;
                self.collect(right, region)
            }
            OperatorKind::Select { input, predicate } => {
                self.collect(input, region)?;
                region.predicates.push(predicate.clone());
                Ok(())
            }
            _ => {
                region.operands.push(self.reorder(op)?);
                Ok(())
            }
        }
    }

    /// Wraps `op` in a selection for every pending predicate it can evaluate
    fn attach_ready(
        &self,
        mut op: LogicalOperator,
        pending: &mut Vec<Predicate>,
    ) -> Result<LogicalOperator, PlanError> {
        let mut waiting = Vec::with_capacity(pending.len());
        for predicate in pending.drain(..) {
            if op.output()?.contains_all(predicate.referenced_attributes()) {
                op = self.accept(LogicalOperator::select(op, predicate))?;
            } else {
                waiting.push(predicate);
            }
        }
        *pending = waiting;
        Ok(op)
    }
}

impl RewritePass for JoinReorder<'_> {
    fn name(&self) -> &'static str {
        "join reordering"
    }

    fn apply(&self, plan: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        self.reorder(plan)
    }
}

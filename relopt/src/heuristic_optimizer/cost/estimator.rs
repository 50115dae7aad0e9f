/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::super::operators::{LogicalOperator, OperatorKind};
use crate::custom_error::PlanError;
use log::trace;
use shared::{Attribute, NamedRelation, Predicate, Relation};

/// Cardinality estimator for logical plans.
///
/// Uses the textbook uniform-distribution and independence assumptions: an
/// equality selection keeps `1 / V` of its input, where `V` is the number of
/// distinct values of the compared attribute. Tuple counts are rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardinalityEstimator;

impl CardinalityEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimates the output relation of `op`, annotating every node below it.
    ///
    /// The result is memoised in the operator's output slot, so estimating an
    /// already annotated node returns the cached relation.
    pub fn estimate<'p>(&self, op: &'p LogicalOperator) -> Result<&'p Relation, PlanError> {
        if let Some(output) = op.output_slot().get() {
            return Ok(output);
        }

        let output = match op.kind() {
            OperatorKind::Scan { relation } => self.visit_scan(relation),
            OperatorKind::Project { input, attributes } => {
                let input = self.estimate(input)?;
                self.visit_project(input, attributes)?
            }
            OperatorKind::Select { input, predicate } => {
                let input = self.estimate(input)?;
                self.visit_select(input, predicate)?
            }
            OperatorKind::Product { left, right } => {
                let left = self.estimate(left)?;
                let right = self.estimate(right)?;
                self.visit_product(left, right)
            }
            OperatorKind::Join {
                left,
                right,
                predicate,
            } => {
                let left = self.estimate(left)?;
                let right = self.estimate(right)?;
                self.visit_join(left, right, predicate)?
            }
        };

        trace!("{} estimated as {}", op.name(), output);
        Ok(op.output_slot().get_or_init(|| output))
    }

    fn visit_scan(&self, relation: &NamedRelation) -> Relation {
        relation.relation().clone()
    }

    fn visit_project(&self, input: &Relation, attributes: &[Attribute]) -> Result<Relation, PlanError> {
        if let Some(missing) = attributes.iter().find(|attr| !input.contains(attr)) {
            return Err(PlanError::missing_attribute(missing.name(), "Project"));
        }

        let mut output = Relation::new(input.tuple_count());
        for attr in input.attributes() {
            if attributes.contains(attr) {
                output.add_attribute(attr.clone());
            }
        }
        Ok(output)
    }

    fn visit_select(&self, input: &Relation, predicate: &Predicate) -> Result<Relation, PlanError> {
        match predicate {
            Predicate::Value { attribute, .. } => {
                let attr = lookup(input, attribute, "Select")?;
                let tuple_count = input.tuple_count().div_ceil(attr.value_count().max(1));

                let mut output = Relation::new(tuple_count);
                for other in input.attributes() {
                    if other == attr {
                        output.add_attribute(other.with_value_count(1));
                    } else {
                        output.add_attribute(other.clone());
                    }
                }
                Ok(output)
            }
            Predicate::Attributes { left, right } => {
                let left = lookup(input, left, "Select")?;
                let right = lookup(input, right, "Select")?;
                let largest = left.value_count().max(right.value_count()).max(1);
                let smallest = left.value_count().min(right.value_count());
                let tuple_count = input.tuple_count().div_ceil(largest);

                let mut output = Relation::new(tuple_count);
                for other in input.attributes() {
                    if other == left || other == right {
                        output.add_attribute(other.with_value_count(smallest));
                    } else {
                        output.add_attribute(other.clone());
                    }
                }
                Ok(output)
            }
        }
    }

    fn visit_product(&self, left: &Relation, right: &Relation) -> Relation {
        let mut output = Relation::new(left.tuple_count().saturating_mul(right.tuple_count()));
        for attr in left.attributes().iter().chain(right.attributes()) {
            output.add_attribute(attr.clone());
        }
        output
    }

    fn visit_join(
        &self,
        left: &Relation,
        right: &Relation,
        predicate: &Predicate,
    ) -> Result<Relation, PlanError> {
        let Predicate::Attributes {
            left: left_attr,
            right: right_attr,
        } = predicate
        else {
            return Err(PlanError::NonEquiJoin(predicate.to_string()));
        };

        let left_attr = lookup(left, left_attr, "Join")?;
        let right_attr = lookup(right, right_attr, "Join")?;
        let largest = left_attr.value_count().max(right_attr.value_count()).max(1);
        let smallest = left_attr.value_count().min(right_attr.value_count());
        let tuple_count = left
            .tuple_count()
            .saturating_mul(right.tuple_count())
            .div_ceil(largest);

        let mut output = Relation::new(tuple_count);
        for attr in left.attributes() {
            if attr == left_attr {
                output.add_attribute(attr.with_value_count(smallest));
            } else {
                output.add_attribute(attr.clone());
            }
        }
        for attr in right.attributes() {
            if attr == right_attr {
                output.add_attribute(attr.with_value_count(smallest));
            } else {
                output.add_attribute(attr.clone());
            }
        }
        Ok(output)
    }

    /// Sum of the estimated tuple counts of every operator in the plan.
    ///
    /// This is the size of all intermediate results the plan would materialise
    /// and is the measure the rewrite passes try to reduce.
    pub fn plan_cost(&self, plan: &LogicalOperator) -> Result<u64, PlanError> {
        let own = self.estimate(plan)?.tuple_count();
        plan.inputs()
            .into_iter()
            .try_fold(own, |total, input| Ok(total.saturating_add(self.plan_cost(input)?)))
    }
}

fn lookup<'r>(
    relation: &'r Relation,
    attribute: &Attribute,
    operator: &'static str,
) -> Result<&'r Attribute, PlanError> {
    relation
        .attribute(attribute.name())
        .ok_or_else(|| PlanError::missing_attribute(attribute.name(), operator))
}

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
use crate::heuristic_optimizer::types::AttributeSet;
use crate::heuristic_optimizer::utils::{annotated, has_exactly, retained_attributes};
use log::trace;
use shared::Predicate;

/// Drops attributes nobody above needs as early as possible.
///
/// The required set starts as the root's output, is replaced by the kept list
/// of every projection met on the way down, and grows by the attributes of
/// each selection or join predicate. Products, joins and scans producing more
/// than the required set get a projection on top.
pub struct ProjectionPushdown<'e> {
    estimator: &'e CardinalityEstimator,
}

impl<'e> ProjectionPushdown<'e> {
    pub fn new(estimator: &'e CardinalityEstimator) -> Self {
        Self { estimator }
    }

    fn accept(&self, op: LogicalOperator) -> Result<LogicalOperator, PlanError> {
        annotated(self.estimator, op)
    }

    fn push(&self, op: &LogicalOperator, required: &AttributeSet) -> Result<LogicalOperator, PlanError> {
        match op.kind() {
            OperatorKind::Scan { .. } => {
                let scan = self.accept(op.detached())?;
                self.narrow(scan, required)
            }
            OperatorKind::Project { input, attributes } => {
                let kept: AttributeSet = attributes.iter().cloned().collect();
                let input = self.push(input, &kept)?;
                if has_exactly(input.output()?, attributes) {
                    trace!("eliding redundant projection over {}", input);
                    return Ok(input);
                }
                self.accept(LogicalOperator::project(input, attributes.clone()))
            }
            OperatorKind::Select { input, predicate } => {
                let needed = with_predicate(required, predicate);
                let input = self.push(input, &needed)?;
                self.accept(LogicalOperator::select(input, predicate.clone()))
            }
            OperatorKind::Product { left, right } => {
                let left = self.push(left, required)?;
                let right = self.push(right, required)?;
                let product = self.accept(LogicalOperator::product(left, right))?;
                self.narrow(product, required)
            }
            OperatorKind::Join {
                left,
                right,
                predicate,
            } => {
                let needed = with_predicate(required, predicate);
                let left = self.push(left, &needed)?;
                let right = self.push(right, &needed)?;
                let join = self.accept(LogicalOperator::join(left, right, predicate.clone()))?;
                self.narrow(join, required)
            }
        }
    }

    /// Projects `op` onto the required attributes when that drops at least one
    fn narrow(&self, op: LogicalOperator, required: &AttributeSet) -> Result<LogicalOperator, PlanError> {
        let output = op.output()?;
        let kept = retained_attributes(output, required);
        if kept.is_empty() || kept.len() == output.attributes().len() {
            return Ok(op);
        }
        self.accept(LogicalOperator::project(op, kept))
    }
}

fn with_predicate(required: &AttributeSet, predicate: &Predicate) -> AttributeSet {
    let mut needed = required.clone();
    needed.extend(predicate.referenced_attributes().into_iter().cloned());
    needed
}

impl RewritePass for ProjectionPushdown<'_> {
    fn name(&self) -> &'static str {
        "projection pushdown"
    }

    fn apply(&self, plan: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        let required: AttributeSet = self.estimator.estimate(plan)?.attributes().iter().cloned().collect();
        self.push(plan, &required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Attribute, Catalogue};

    fn create_test_catalogue() -> Catalogue {
        let mut cat = Catalogue::new();
        cat.create_relation("A", 200).unwrap();
        cat.create_attribute("A", "a1", 100).unwrap();
        cat.create_attribute("A", "a2", 15).unwrap();
        cat.create_attribute("A", "a3", 5).unwrap();
        cat.create_relation("B", 250).unwrap();
        cat.create_attribute("B", "b1", 150).unwrap();
        cat.create_attribute("B", "b2", 100).unwrap();
        cat
    }

    fn scan(cat: &Catalogue, name: &str) -> LogicalOperator {
        LogicalOperator::scan(cat.relation(name).unwrap())
    }

    fn scenario_after_fusion(cat: &Catalogue) -> LogicalOperator {
        LogicalOperator::project(
            LogicalOperator::join(
                LogicalOperator::select(
                    scan(cat, "A"),
                    Predicate::value(Attribute::named("a2"), "5"),
                ),
                scan(cat, "B"),
                Predicate::attributes(Attribute::named("a1"), Attribute::named("b2")),
            ),
            vec![Attribute::named("a2")],
        )
    }

    #[test]
    fn test_projections_pushed_below_join() {
        let cat = create_test_catalogue();
        let estimator = CardinalityEstimator::new();
        let plan = scenario_after_fusion(&cat);
        let pushed = ProjectionPushdown::new(&estimator).apply(&plan).unwrap();
        assert_eq!(
            pushed.to_string(),
            "PROJECT [a2] ((SELECT [a2=\"5\"] (PROJECT [a1,a2] (A))) JOIN [a1=b2] (PROJECT [b2] (B)))"
        );
        assert_eq!(pushed.output().unwrap().attribute_names(), vec!["a2"]);
        assert_eq!(pushed.output().unwrap().tuple_count(), 35);
    }

    #[test]
    fn test_pushdown_is_idempotent() {
        let cat = create_test_catalogue();
        let estimator = CardinalityEstimator::new();
        let pass = ProjectionPushdown::new(&estimator);
        let once = pass.apply(&scenario_after_fusion(&cat)).unwrap();
        let twice = pass.apply(&once).unwrap();
        assert_eq!(once.to_string(), twice.to_string());
        assert_eq!(once.operator_count(), twice.operator_count());
    }

    #[test]
    fn test_unprojected_root_keeps_every_attribute() {
        let cat = create_test_catalogue();
        let estimator = CardinalityEstimator::new();
        let plan = LogicalOperator::join(
            scan(&cat, "A"),
            scan(&cat, "B"),
            Predicate::attributes(Attribute::named("a1"), Attribute::named("b1")),
        );
        let pushed = ProjectionPushdown::new(&estimator).apply(&plan).unwrap();
        assert_eq!(pushed.to_string(), "(A) JOIN [a1=b1] (B)");
    }

    #[test]
    fn test_product_without_needed_attributes_is_not_emptied() {
        let cat = create_test_catalogue();
        let estimator = CardinalityEstimator::new();
        let plan = LogicalOperator::project(
            LogicalOperator::product(scan(&cat, "A"), scan(&cat, "B")),
            vec![Attribute::named("a3")],
        );
        let pushed = ProjectionPushdown::new(&estimator).apply(&plan).unwrap();
        // B contributes no attribute but a projection to nothing is never built
        assert_eq!(pushed.to_string(), "PROJECT [a3] ((PROJECT [a3] (A)) TIMES (B))");
        assert_eq!(pushed.output().unwrap().tuple_count(), 50_000);
    }
}

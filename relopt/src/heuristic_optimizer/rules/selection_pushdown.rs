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

/// Moves every selection as close to the scans as its attributes allow.
///
/// A selection sinks through other selections, projections, products and
/// joins. At a binary operator a value predicate goes to every input exposing
/// its attribute, and an attribute comparison goes to the input holding both
/// attributes. A comparison whose attributes are split across the inputs stays
/// directly above the binary operator, where join fusion can pick it up.
pub struct SelectionPushdown<'e> {
    estimator: &'e CardinalityEstimator,
}

impl<'e> SelectionPushdown<'e> {
    pub fn new(estimator: &'e CardinalityEstimator) -> Self {
        Self { estimator }
    }

    fn accept(&self, op: LogicalOperator) -> Result<LogicalOperator, PlanError> {
        annotated(self.estimator, op)
    }

    fn rewrite(&self, op: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        match op.kind() {
            OperatorKind::Scan { .. } => self.accept(op.detached()),
            OperatorKind::Select { input, predicate } => {
                let input = self.rewrite(input)?;
                self.push(predicate.clone(), input)
            }
            OperatorKind::Project { input, attributes } => {
                let input = self.rewrite(input)?;
                self.accept(LogicalOperator::project(input, attributes.clone()))
            }
            OperatorKind::Product { left, right } => {
                let left = self.rewrite(left)?;
                let right = self.rewrite(right)?;
                self.accept(LogicalOperator::product(left, right))
            }
            OperatorKind::Join {
                left,
                right,
                predicate,
            } => {
                let left = self.rewrite(left)?;
                let right = self.rewrite(right)?;
                self.accept(LogicalOperator::join(left, right, predicate.clone()))
            }
        }
    }

    /// Sinks `predicate` into an already rewritten, estimated subtree
    fn push(&self, predicate: Predicate, op: LogicalOperator) -> Result<LogicalOperator, PlanError> {
        let here = op.output()?.contains_all(predicate.referenced_attributes());

        match op.into_kind() {
            OperatorKind::Scan { relation } => {
                let scan = self.accept(LogicalOperator::scan(relation))?;
                if here {
                    self.accept(LogicalOperator::select(scan, predicate))
                } else {
                    trace!("dropping {} below {}", predicate, scan);
                    Ok(scan)
                }
            }
            OperatorKind::Select {
                input,
                predicate: inner,
            } => {
                let input = self.push(predicate, *input)?;
                self.accept(LogicalOperator::select(input, inner))
            }
            OperatorKind::Project { input, attributes } => {
                let input = self.push(predicate, *input)?;
                self.accept(LogicalOperator::project(input, attributes))
            }
            OperatorKind::Product { left, right } => {
                self.push_into_inputs(predicate, *left, *right, here, "Product", LogicalOperator::product)
            }
            OperatorKind::Join {
                left,
                right,
                predicate: join_predicate,
            } => self.push_into_inputs(predicate, *left, *right, here, "Join", |l, r| {
                LogicalOperator::join(l, r, join_predicate)
            }),
        }
    }

    fn push_into_inputs<F>(
        &self,
        predicate: Predicate,
        left: LogicalOperator,
        right: LogicalOperator,
        here: bool,
        operator: &'static str,
        rebuild: F,
    ) -> Result<LogicalOperator, PlanError>
    where
        F: FnOnce(LogicalOperator, LogicalOperator) -> LogicalOperator,
    {
        let in_left = left.output()?.contains_all(predicate.referenced_attributes());
        let in_right = right.output()?.contains_all(predicate.referenced_attributes());

        if predicate.equals_value() {
            if !in_left && !in_right {
                return Err(PlanError::missing_attribute(
                    predicate.left_attribute().name(),
                    operator,
                ));
            }
            let left = if in_left {
                self.push(predicate.clone(), left)?
            } else {
                left
            };
            let right = if in_right {
                self.push(predicate, right)?
            } else {
                right
            };
            return self.accept(rebuild(left, right));
        }

        if in_left {
            let left = self.push(predicate, left)?;
            self.accept(rebuild(left, right))
        } else if in_right {
            let right = self.push(predicate, right)?;
            self.accept(rebuild(left, right))
        } else if here {
            trace!("keeping {} above {}", predicate, operator);
            let node = self.accept(rebuild(left, right))?;
            self.accept(LogicalOperator::select(node, predicate))
        } else {
            let left = self.push(predicate.clone(), left)?;
            let right = self.push(predicate, right)?;
            self.accept(rebuild(left, right))
        }
    }
}

impl RewritePass for SelectionPushdown<'_> {
    fn name(&self) -> &'static str {
        "selection pushdown"
    }

    fn apply(&self, plan: &LogicalOperator) -> Result<LogicalOperator, PlanError> {
        self.rewrite(plan)
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
        cat.create_relation("C", 50).unwrap();
        cat.create_attribute("C", "c1", 10).unwrap();
        cat
    }

    fn scan(cat: &Catalogue, name: &str) -> LogicalOperator {
        LogicalOperator::scan(cat.relation(name).unwrap())
    }

    fn attrs(left: &str, right: &str) -> Predicate {
        Predicate::attributes(Attribute::named(left), Attribute::named(right))
    }

    fn value(attr: &str, value: &str) -> Predicate {
        Predicate::value(Attribute::named(attr), value)
    }

    fn run(plan: LogicalOperator) -> LogicalOperator {
        let estimator = CardinalityEstimator::new();
        estimator.estimate(&plan).unwrap();
        SelectionPushdown::new(&estimator).apply(&plan).unwrap()
    }

    #[test]
    fn test_scenario_pushes_value_and_keeps_join_predicate() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::project(
            LogicalOperator::select(
                LogicalOperator::select(
                    LogicalOperator::product(scan(&cat, "A"), scan(&cat, "B")),
                    value("a2", "5"),
                ),
                attrs("a1", "b2"),
            ),
            vec![Attribute::named("a2")],
        );

        let rewritten = run(plan);
        assert_eq!(
            rewritten.to_string(),
            "PROJECT [a2] (SELECT [a1=b2] ((SELECT [a2=\"5\"] (A)) TIMES (B)))"
        );
        assert!(rewritten.is_estimated());
    }

    #[test]
    fn test_predicate_local_to_one_side_sinks_into_it() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::select(
            LogicalOperator::product(scan(&cat, "A"), scan(&cat, "B")),
            attrs("b1", "b2"),
        );
        assert_eq!(run(plan).to_string(), "(A) TIMES (SELECT [b1=b2] (B))");
    }

    #[test]
    fn test_predicate_sinks_through_nested_products() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::select(
            LogicalOperator::select(
                LogicalOperator::product(
                    LogicalOperator::product(scan(&cat, "A"), scan(&cat, "B")),
                    scan(&cat, "C"),
                ),
                value("c1", "x"),
            ),
            attrs("a1", "b1"),
        );
        assert_eq!(
            run(plan).to_string(),
            "(SELECT [a1=b1] ((A) TIMES (B))) TIMES (SELECT [c1=\"x\"] (C))"
        );
    }

    #[test]
    fn test_predicate_sinks_through_project_and_join() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::select(
            LogicalOperator::project(
                LogicalOperator::join(scan(&cat, "A"), scan(&cat, "B"), attrs("a1", "b1")),
                vec![Attribute::named("a3"), Attribute::named("b1")],
            ),
            value("a3", "1"),
        );
        assert_eq!(
            run(plan).to_string(),
            "PROJECT [a3,b1] ((SELECT [a3=\"1\"] (A)) JOIN [a1=b1] (B))"
        );
    }

    #[test]
    fn test_pushdown_never_increases_selected_estimate() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::select(
            LogicalOperator::product(scan(&cat, "A"), scan(&cat, "B")),
            value("a2", "5"),
        );
        let estimator = CardinalityEstimator::new();
        let before = estimator.plan_cost(&plan).unwrap();
        let rewritten = SelectionPushdown::new(&estimator).apply(&plan).unwrap();
        let after = estimator.plan_cost(&rewritten).unwrap();
        assert!(after < before);
        assert_eq!(
            rewritten.output().unwrap().attribute_names(),
            plan.output().unwrap().attribute_names()
        );
    }

    #[test]
    fn test_input_plan_is_left_untouched() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::select(
            LogicalOperator::product(scan(&cat, "A"), scan(&cat, "B")),
            value("b1", "7"),
        );
        let estimator = CardinalityEstimator::new();
        estimator.estimate(&plan).unwrap();
        let original = plan.to_string();
        SelectionPushdown::new(&estimator).apply(&plan).unwrap();
        assert_eq!(plan.to_string(), original);
    }
}

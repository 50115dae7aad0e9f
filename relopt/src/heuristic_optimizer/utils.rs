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
use super::operators::{LogicalOperator, OperatorKind};
use super::types::AttributeSet;
use crate::custom_error::PlanError;
use shared::{Attribute, Relation};
use std::fmt::Write;

/// Estimates a freshly built operator and hands it back
pub fn annotated(
    estimator: &CardinalityEstimator,
    op: LogicalOperator,
) -> Result<LogicalOperator, PlanError> {
    estimator.estimate(&op)?;
    Ok(op)
}

/// True when the relation exposes exactly the attributes of `attributes`, ignoring order
pub fn has_exactly(relation: &Relation, attributes: &[Attribute]) -> bool {
    relation.attributes().iter().all(|attr| attributes.contains(attr))
        && attributes.iter().all(|attr| relation.contains(attr))
}

/// Attributes of `relation` that are in `required`, in relation order
pub fn retained_attributes(relation: &Relation, required: &AttributeSet) -> Vec<Attribute> {
    relation
        .attributes()
        .iter()
        .filter(|attr| required.contains(*attr))
        .cloned()
        .collect()
}

/// Names of the stored relations read by the plan, left to right
pub fn scanned_relations(plan: &LogicalOperator) -> Vec<&str> {
    match plan.kind() {
        OperatorKind::Scan { relation } => vec![relation.name()],
        _ => plan
            .inputs()
            .into_iter()
            .flat_map(scanned_relations)
            .collect(),
    }
}

/// Renders the plan as an indented tree, one operator per line, with its estimate
pub fn render_plan(plan: &LogicalOperator) -> String {
    let mut out = String::new();
    render_node(plan, 0, &mut out);
    out
}

fn render_node(op: &LogicalOperator, depth: usize, out: &mut String) {
    let label = match op.kind() {
        OperatorKind::Scan { relation } => format!("SCAN {}", relation.name()),
        OperatorKind::Select { predicate, .. } => format!("SELECT [{}]", predicate),
        OperatorKind::Project { attributes, .. } => {
            let names: Vec<&str> = attributes.iter().map(Attribute::name).collect();
            format!("PROJECT [{}]", names.join(","))
        }
        OperatorKind::Product { .. } => "PRODUCT".to_string(),
        OperatorKind::Join { predicate, .. } => format!("JOIN [{}]", predicate),
    };
    let estimate = match op.output() {
        Ok(relation) => relation.to_string(),
        Err(_) => "not estimated".to_string(),
    };
    let _ = writeln!(out, "{}{}  <{}>", "  ".repeat(depth), label, estimate);
    for input in op.inputs() {
        render_node(input, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Catalogue, Predicate};

    fn create_test_catalogue() -> Catalogue {
        let mut cat = Catalogue::new();
        cat.create_relation("A", 20).unwrap();
        cat.create_attribute("A", "a1", 10).unwrap();
        cat.create_relation("B", 30).unwrap();
        cat.create_attribute("B", "b1", 5).unwrap();
        cat
    }

    #[test]
    fn test_render_plan_with_estimates() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::select(
            LogicalOperator::product(
                LogicalOperator::scan(cat.relation("A").unwrap()),
                LogicalOperator::scan(cat.relation("B").unwrap()),
            ),
            Predicate::attributes(Attribute::named("a1"), Attribute::named("b1")),
        );
        let estimator = CardinalityEstimator::new();
        let plan = annotated(&estimator, plan).unwrap();

        let expected = "SELECT [a1=b1]  <60 tuples [a1:5, b1:5]>\n  \
                        PRODUCT  <600 tuples [a1:10, b1:5]>\n    \
                        SCAN A  <20 tuples [a1:10]>\n    \
                        SCAN B  <30 tuples [b1:5]>\n";
        assert_eq!(render_plan(&plan), expected);
        assert_eq!(scanned_relations(&plan), vec!["A", "B"]);
    }

    #[test]
    fn test_render_unestimated_plan() {
        let cat = create_test_catalogue();
        let plan = LogicalOperator::scan(cat.relation("A").unwrap());
        assert_eq!(render_plan(&plan), "SCAN A  <not estimated>\n");
    }

    #[test]
    fn test_retained_attributes_follow_relation_order() {
        let relation = Relation::new(1)
            .with_attribute(Attribute::new("x", 1))
            .with_attribute(Attribute::new("y", 1))
            .with_attribute(Attribute::new("z", 1));
        let required: AttributeSet = [Attribute::named("z"), Attribute::named("x"), Attribute::named("q")]
            .into_iter()
            .collect();
        let kept = retained_attributes(&relation, &required);
        assert_eq!(kept, vec![Attribute::named("x"), Attribute::named("z")]);
        assert!(!has_exactly(&relation, &kept));
        assert!(has_exactly(
            &relation,
            &[Attribute::named("z"), Attribute::named("y"), Attribute::named("x")]
        ));
    }
}

/*
 * Copyright © 2024 ladroid
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::custom_error::PlanError;
use crate::heuristic_optimizer::LogicalOperator;
use shared::{Catalogue, Predicate};

/// Fluent construction of logical plans, resolving names through a catalogue.
///
/// The first failing step is remembered and returned by [`PlanBuilder::build`];
/// later steps are skipped.
pub struct PlanBuilder<'a> {
    catalogue: &'a Catalogue,
    plan: Result<LogicalOperator, PlanError>,
}

impl<'a> PlanBuilder<'a> {
    /// Starts a plan with a scan of `relation`
    pub fn scan(catalogue: &'a Catalogue, relation: &str) -> Self {
        let plan = catalogue
            .relation(relation)
            .map(LogicalOperator::scan)
            .map_err(PlanError::from);
        Self { catalogue, plan }
    }

    /// Starts from an existing plan
    pub fn from_plan(catalogue: &'a Catalogue, plan: LogicalOperator) -> Self {
        Self {
            catalogue,
            plan: Ok(plan),
        }
    }

    fn then<F>(self, step: F) -> Self
    where
        F: FnOnce(&'a Catalogue, LogicalOperator) -> Result<LogicalOperator, PlanError>,
    {
        let catalogue = self.catalogue;
        Self {
            catalogue,
            plan: self.plan.and_then(|plan| step(catalogue, plan)),
        }
    }

    /// Cartesian product with a scan of `relation` on the right
    pub fn product(self, relation: &str) -> Self {
        self.then(|cat, plan| {
            let right = LogicalOperator::scan(cat.relation(relation)?);
            Ok(LogicalOperator::product(plan, right))
        })
    }

    /// Cartesian product with an already built plan on the right
    pub fn product_with(self, right: LogicalOperator) -> Self {
        self.then(|_, plan| Ok(LogicalOperator::product(plan, right)))
    }

    /// Equi-join with a scan of `relation`, comparing `left` from the current plan to `right`
    pub fn join(self, relation: &str, left: &str, right: &str) -> Self {
        self.then(|cat, plan| {
            let scan = LogicalOperator::scan(cat.relation(relation)?);
            let predicate = Predicate::attributes(cat.attribute(left)?, cat.attribute(right)?);
            Ok(LogicalOperator::join(plan, scan, predicate))
        })
    }

    /// Selection `attribute = "value"`
    pub fn select_value(self, attribute: &str, value: &str) -> Self {
        self.then(|cat, plan| {
            let predicate = Predicate::value(cat.attribute(attribute)?, value);
            Ok(LogicalOperator::select(plan, predicate))
        })
    }

    /// Selection `left = right`
    pub fn select_attributes(self, left: &str, right: &str) -> Self {
        self.then(|cat, plan| {
            let predicate = Predicate::attributes(cat.attribute(left)?, cat.attribute(right)?);
            Ok(LogicalOperator::select(plan, predicate))
        })
    }

    pub fn project(self, attributes: &[&str]) -> Self {
        self.then(|cat, plan| {
            let attributes = attributes
                .iter()
                .map(|name| cat.attribute(name))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LogicalOperator::project(plan, attributes))
        })
    }

    pub fn build(self) -> Result<LogicalOperator, PlanError> {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::CatalogueError;

    fn create_test_catalogue() -> Catalogue {
        let mut cat = Catalogue::new();
        cat.create_relation("A", 200).unwrap();
        cat.create_attribute("A", "a1", 100).unwrap();
        cat.create_attribute("A", "a2", 15).unwrap();
        cat.create_relation("B", 250).unwrap();
        cat.create_attribute("B", "b1", 150).unwrap();
        cat.create_attribute("B", "b2", 100).unwrap();
        cat
    }

    #[test]
    fn test_builds_scenario_plan() {
        let cat = create_test_catalogue();
        let plan = PlanBuilder::scan(&cat, "A")
            .product("B")
            .select_value("a2", "5")
            .select_attributes("a1", "b2")
            .project(&["a2"])
            .build()
            .unwrap();
        assert_eq!(
            plan.to_string(),
            "PROJECT [a2] (SELECT [a1=b2] (SELECT [a2=\"5\"] ((A) TIMES (B))))"
        );
    }

    #[test]
    fn test_join_step() {
        let cat = create_test_catalogue();
        let plan = PlanBuilder::scan(&cat, "A")
            .join("B", "a1", "b1")
            .build()
            .unwrap();
        assert_eq!(plan.to_string(), "(A) JOIN [a1=b1] (B)");

        let inner = PlanBuilder::scan(&cat, "B").build().unwrap();
        let plan = PlanBuilder::from_plan(&cat, LogicalOperator::scan(cat.relation("A").unwrap()))
            .product_with(inner)
            .build()
            .unwrap();
        assert_eq!(plan.to_string(), "(A) TIMES (B)");
    }

    #[test]
    fn test_first_error_is_kept() {
        let cat = create_test_catalogue();
        let result = PlanBuilder::scan(&cat, "A")
            .select_value("zz", "1")
            .product("Missing")
            .build();
        match result {
            Err(PlanError::Catalogue(CatalogueError::NotFound { kind, name })) => {
                assert_eq!(kind, "attribute");
                assert_eq!(name, "zz");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}

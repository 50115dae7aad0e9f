/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::custom_error::PlanError;
use shared::{Attribute, NamedRelation, Predicate, Relation};
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Relational-algebra operators making up a logical plan
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorKind {
    Scan {
        relation: Arc<NamedRelation>,
    },
    Select {
        input: Box<LogicalOperator>,
        predicate: Predicate,
    },
    Project {
        input: Box<LogicalOperator>,
        attributes: Vec<Attribute>,
    },
    Product {
        left: Box<LogicalOperator>,
        right: Box<LogicalOperator>,
    },
    Join {
        left: Box<LogicalOperator>,
        right: Box<LogicalOperator>,
        predicate: Predicate,
    },
}

/// A node of a logical plan.
///
/// Children are owned exclusively. The output slot holds the estimated result
/// relation and is filled once by the cardinality estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOperator {
    kind: OperatorKind,
    output: OnceCell<Relation>,
}

impl LogicalOperator {
    fn new(kind: OperatorKind) -> Self {
        Self {
            kind,
            output: OnceCell::new(),
        }
    }

    /// Creates a new scan of a stored relation
    pub fn scan(relation: Arc<NamedRelation>) -> Self {
        Self::new(OperatorKind::Scan { relation })
    }

    /// Creates a new selection over `input`
    pub fn select(input: LogicalOperator, predicate: Predicate) -> Self {
        Self::new(OperatorKind::Select {
            input: Box::new(input),
            predicate,
        })
    }

    /// Creates a new projection keeping `attributes`
    pub fn project(input: LogicalOperator, attributes: Vec<Attribute>) -> Self {
        Self::new(OperatorKind::Project {
            input: Box::new(input),
            attributes,
        })
    }

    /// Creates a new cartesian product
    pub fn product(left: LogicalOperator, right: LogicalOperator) -> Self {
        Self::new(OperatorKind::Product {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Creates a new equi-join
    pub fn join(left: LogicalOperator, right: LogicalOperator, predicate: Predicate) -> Self {
        Self::new(OperatorKind::Join {
            left: Box::new(left),
            right: Box::new(right),
            predicate,
        })
    }

    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    pub fn into_kind(self) -> OperatorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            OperatorKind::Scan { .. } => "Scan",
            OperatorKind::Select { .. } => "Select",
            OperatorKind::Project { .. } => "Project",
            OperatorKind::Product { .. } => "Product",
            OperatorKind::Join { .. } => "Join",
        }
    }

    /// Estimated output relation; fails if the estimator has not visited this node
    pub fn output(&self) -> Result<&Relation, PlanError> {
        self.output.get().ok_or(PlanError::PrematureRead(self.name()))
    }

    pub fn is_estimated(&self) -> bool {
        self.output.get().is_some()
    }

    pub(crate) fn output_slot(&self) -> &OnceCell<Relation> {
        &self.output
    }

    pub fn inputs(&self) -> Vec<&LogicalOperator> {
        match &self.kind {
            OperatorKind::Scan { .. } => vec![],
            OperatorKind::Select { input, .. } | OperatorKind::Project { input, .. } => {
                vec![input.as_ref()]
            }
            OperatorKind::Product { left, right } | OperatorKind::Join { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
        }
    }

    pub fn is_scan(&self) -> bool {
        matches!(self.kind, OperatorKind::Scan { .. })
    }

    pub fn is_product(&self) -> bool {
        matches!(self.kind, OperatorKind::Product { .. })
    }

    /// Scan, or a chain of selections whose bottom is a scan
    pub fn is_filtered_scan(&self) -> bool {
        match &self.kind {
            OperatorKind::Scan { .. } => true,
            OperatorKind::Select { input, .. } => input.is_filtered_scan(),
            _ => false,
        }
    }

    /// Splits a product into its inputs, handing back any other operator untouched
    pub fn into_product_inputs(self) -> Result<(LogicalOperator, LogicalOperator), LogicalOperator> {
        match self.kind {
            OperatorKind::Product { left, right } => Ok((*left, *right)),
            kind => Err(LogicalOperator {
                kind,
                output: self.output,
            }),
        }
    }

    /// Deep copy of the subtree with every output slot cleared
    pub fn detached(&self) -> LogicalOperator {
        let kind = match &self.kind {
            OperatorKind::Scan { relation } => OperatorKind::Scan {
                relation: Arc::clone(relation),
            },
            OperatorKind::Select { input, predicate } => OperatorKind::Select {
                input: Box::new(input.detached()),
                predicate: predicate.clone(),
            },
            OperatorKind::Project { input, attributes } => OperatorKind::Project {
                input: Box::new(input.detached()),
                attributes: attributes.clone(),
            },
            OperatorKind::Product { left, right } => OperatorKind::Product {
                left: Box::new(left.detached()),
                right: Box::new(right.detached()),
            },
            OperatorKind::Join {
                left,
                right,
                predicate,
            } => OperatorKind::Join {
                left: Box::new(left.detached()),
                right: Box::new(right.detached()),
                predicate: predicate.clone(),
            },
        };
        LogicalOperator::new(kind)
    }

    /// Number of operators in the subtree, this node included
    pub fn operator_count(&self) -> usize {
        1 + self
            .inputs()
            .into_iter()
            .map(LogicalOperator::operator_count)
            .sum::<usize>()
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OperatorKind::Scan { relation } => write!(f, "{}", relation.name()),
            OperatorKind::Select { input, predicate } => {
                write!(f, "SELECT [{}] ({})", predicate, input)
            }
            OperatorKind::Project { input, attributes } => {
                let names: Vec<&str> = attributes.iter().map(Attribute::name).collect();
                write!(f, "PROJECT [{}] ({})", names.join(","), input)
            }
            OperatorKind::Product { left, right } => write!(f, "({}) TIMES ({})", left, right),
            OperatorKind::Join {
                left,
                right,
                predicate,
            } => write!(f, "({}) JOIN [{}] ({})", left, predicate, right),
        }
    }
}

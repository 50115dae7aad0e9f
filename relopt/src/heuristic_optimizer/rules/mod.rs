/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Heuristic rewrite passes, applied by the optimiser in declaration order

pub mod join_fusion;
pub mod join_reorder;
pub mod projection_pushdown;
pub mod selection_pushdown;

pub use join_fusion::JoinFusion;
pub use join_reorder::JoinReorder;
pub use projection_pushdown::ProjectionPushdown;
pub use selection_pushdown::SelectionPushdown;

use super::operators::LogicalOperator;
use crate::custom_error::PlanError;

/// A whole-plan rewrite.
///
/// `apply` takes an estimated plan and returns a new, fully estimated plan
/// producing the same attributes. The input is never modified.
pub trait RewritePass {
    fn name(&self) -> &'static str;

    fn apply(&self, plan: &LogicalOperator) -> Result<LogicalOperator, PlanError>;
}

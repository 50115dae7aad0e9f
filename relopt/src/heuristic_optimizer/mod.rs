/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Heuristic optimizer for relational-algebra plans
//!
//! This module estimates the size of logical plans and rewrites them with a
//! fixed pipeline of heuristics:
//!
//! - Selection pushdown towards the scans
//! - Left-deep reordering of products, smallest input first
//! - Fusion of selections over products into equi-joins
//! - Projection pushdown to drop unused attributes early
//!
//! ## Architecture
//!
//! - `operators`: Logical operator tree
//! - `cost`: Cardinality estimation
//! - `rules`: The rewrite passes
//! - `optimizer`: Pass pipeline
//! - `types`: Configuration and shared type aliases
//! - `utils`: Plan inspection helpers
//!
//! ## Usage
//!
//! ```ignore
//! use relopt::heuristic_optimizer::{LogicalOperator, Optimiser};
//!
//! let plan = LogicalOperator::project(
//!     LogicalOperator::select(LogicalOperator::product(a, b), predicate),
//!     attributes,
//! );
//! let optimised = Optimiser::new().optimise(&plan)?;
//! println!("{}", render_plan(&optimised));
//! ```

pub mod cost;
pub mod operators;
pub mod optimizer;
pub mod rules;
pub mod types;
pub mod utils;

// Re-export main components for convenience
pub use cost::CardinalityEstimator;
pub use operators::{LogicalOperator, OperatorKind};
pub use optimizer::Optimiser;
pub use rules::RewritePass;
pub use types::{AttributeSet, OptimizerConfig};
pub use utils::{render_plan, scanned_relations};

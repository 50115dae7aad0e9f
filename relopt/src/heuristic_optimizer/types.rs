/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};
use shared::Attribute;
use std::collections::HashSet;

/// Attributes needed by the operators above a node
pub type AttributeSet = HashSet<Attribute>;

/// Switches for the rewrite passes.
///
/// Enabled passes always run in the fixed order selection pushdown, join
/// reordering, join fusion, projection pushdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub push_down_selections: bool,
    pub reorder_joins: bool,
    pub fuse_joins: bool,
    pub push_down_projections: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            push_down_selections: true,
            reorder_joins: true,
            fuse_joins: true,
            push_down_projections: true,
        }
    }
}

impl OptimizerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

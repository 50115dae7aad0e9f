/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::relation::Attribute;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Equality predicate used by selections and joins
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// `attribute = "value"`
    Value { attribute: Attribute, value: String },
    /// `left = right`
    Attributes { left: Attribute, right: Attribute },
}

impl Predicate {
    pub fn value(attribute: Attribute, value: impl Into<String>) -> Self {
        Self::Value {
            attribute,
            value: value.into(),
        }
    }

    pub fn attributes(left: Attribute, right: Attribute) -> Self {
        Self::Attributes { left, right }
    }

    /// True for `attr = literal`
    pub fn equals_value(&self) -> bool {
        matches!(self, Predicate::Value { .. })
    }

    pub fn left_attribute(&self) -> &Attribute {
        match self {
            Predicate::Value { attribute, .. } => attribute,
            Predicate::Attributes { left, .. } => left,
        }
    }

    pub fn right_attribute(&self) -> Option<&Attribute> {
        match self {
            Predicate::Value { .. } => None,
            Predicate::Attributes { right, .. } => Some(right),
        }
    }

    /// Every attribute the predicate reads
    pub fn referenced_attributes(&self) -> Vec<&Attribute> {
        match self {
            Predicate::Value { attribute, .. } => vec![attribute],
            Predicate::Attributes { left, right } => vec![left, right],
        }
    }

    /// `right = left` for attribute predicates; value predicates are returned unchanged
    pub fn flipped(&self) -> Self {
        match self {
            Predicate::Value { .. } => self.clone(),
            Predicate::Attributes { left, right } => Predicate::Attributes {
                left: right.clone(),
                right: left.clone(),
            },
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Value { attribute, value } => write!(f, "{}=\"{}\"", attribute, value),
            Predicate::Attributes { left, right } => write!(f, "{}={}", left, right),
        }
    }
}

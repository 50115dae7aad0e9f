/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("relation already exists: {0}")]
    DuplicateRelation(String),

    #[error("attribute already exists: {0}")]
    DuplicateAttribute(String),

    #[error("attribute {0} must have a positive value count")]
    InvalidValueCount(String),

    #[error("malformed catalogue definition: {0}")]
    Definition(#[from] serde_json::Error),
}

impl CatalogueError {
    pub fn relation_not_found(name: &str) -> Self {
        CatalogueError::NotFound {
            kind: "relation",
            name: name.to_string(),
        }
    }

    pub fn attribute_not_found(name: &str) -> Self {
        CatalogueError::NotFound {
            kind: "attribute",
            name: name.to_string(),
        }
    }
}

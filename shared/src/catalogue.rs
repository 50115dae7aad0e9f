/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! In-memory catalogue of base relation statistics.
//!
//! Relations are stored behind `Arc` so that scans can hold a snapshot of the
//! relation they read. Attribute names are global: an attribute name belongs
//! to exactly one relation, which lets predicates and projections refer to
//! attributes without qualifying them.

use crate::error::CatalogueError;
use crate::relation::{Attribute, NamedRelation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    relations: HashMap<String, Arc<NamedRelation>>,
    // attribute name -> owning relation name
    attributes: HashMap<String, String>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_relation(
        &mut self,
        name: &str,
        tuple_count: u64,
    ) -> Result<Arc<NamedRelation>, CatalogueError> {
        if self.relations.contains_key(name) {
            return Err(CatalogueError::DuplicateRelation(name.to_string()));
        }
        let relation = Arc::new(NamedRelation::new(name, tuple_count));
        self.relations.insert(name.to_string(), Arc::clone(&relation));
        Ok(relation)
    }

    pub fn create_attribute(
        &mut self,
        relation_name: &str,
        attribute_name: &str,
        value_count: u64,
    ) -> Result<Attribute, CatalogueError> {
        if value_count == 0 {
            return Err(CatalogueError::InvalidValueCount(attribute_name.to_string()));
        }
        if self.attributes.contains_key(attribute_name) {
            return Err(CatalogueError::DuplicateAttribute(attribute_name.to_string()));
        }
        let relation = self
            .relations
            .get_mut(relation_name)
            .ok_or_else(|| CatalogueError::relation_not_found(relation_name))?;

        let attribute = Attribute::new(attribute_name, value_count);
        // Scans created earlier keep the snapshot they were built with
        Arc::make_mut(relation).add_attribute(attribute.clone());
        self.attributes
            .insert(attribute_name.to_string(), relation_name.to_string());
        Ok(attribute)
    }

    pub fn relation(&self, name: &str) -> Result<Arc<NamedRelation>, CatalogueError> {
        self.relations
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogueError::relation_not_found(name))
    }

    pub fn attribute(&self, name: &str) -> Result<Attribute, CatalogueError> {
        self.attributes
            .get(name)
            .and_then(|owner| self.relations.get(owner))
            .and_then(|relation| relation.relation().attribute(name).cloned())
            .ok_or_else(|| CatalogueError::attribute_not_found(name))
    }

    /// Relation names in lexical order
    pub fn relation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.relations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn from_definition(definition: &CatalogueDefinition) -> Result<Self, CatalogueError> {
        let mut catalogue = Catalogue::new();
        for relation in &definition.relations {
            catalogue.create_relation(&relation.name, relation.tuples)?;
            for attribute in &relation.attributes {
                catalogue.create_attribute(&relation.name, &attribute.name, attribute.values)?;
            }
        }
        Ok(catalogue)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogueError> {
        let definition: CatalogueDefinition = serde_json::from_str(json)?;
        Self::from_definition(&definition)
    }
}

/// Serialized form of a catalogue, as read from fixture files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogueDefinition {
    pub relations: Vec<RelationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub name: String,
    pub tuples: u64,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub values: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_catalogue() -> Catalogue {
        let mut cat = Catalogue::new();
        cat.create_relation("A", 200).unwrap();
        cat.create_attribute("A", "a1", 100).unwrap();
        cat.create_attribute("A", "a2", 15).unwrap();
        cat.create_relation("B", 250).unwrap();
        cat.create_attribute("B", "b1", 150).unwrap();
        cat
    }

    #[test]
    fn test_lookup_relation_and_attribute() {
        let cat = create_test_catalogue();
        let a = cat.relation("A").unwrap();
        assert_eq!(a.name(), "A");
        assert_eq!(a.relation().tuple_count(), 200);
        assert_eq!(a.relation().attribute_names(), vec!["a1", "a2"]);

        let b1 = cat.attribute("b1").unwrap();
        assert_eq!(b1.value_count(), 150);
    }

    #[test]
    fn test_unknown_names_are_not_found() {
        let cat = create_test_catalogue();
        assert!(matches!(
            cat.relation("Z"),
            Err(CatalogueError::NotFound { kind: "relation", .. })
        ));
        assert!(matches!(
            cat.attribute("zz"),
            Err(CatalogueError::NotFound { kind: "attribute", .. })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_zero_value_count() {
        let mut cat = create_test_catalogue();
        assert!(matches!(
            cat.create_relation("A", 1),
            Err(CatalogueError::DuplicateRelation(_))
        ));
        assert!(matches!(
            cat.create_attribute("B", "a1", 3),
            Err(CatalogueError::DuplicateAttribute(_))
        ));
        assert!(matches!(
            cat.create_attribute("B", "b9", 0),
            Err(CatalogueError::InvalidValueCount(_))
        ));
        assert!(matches!(
            cat.create_attribute("Q", "q1", 3),
            Err(CatalogueError::NotFound { .. })
        ));
    }

    #[test]
    fn test_snapshot_held_before_new_attribute() {
        let mut cat = Catalogue::new();
        cat.create_relation("C", 10).unwrap();
        let before = cat.relation("C").unwrap();
        cat.create_attribute("C", "c1", 2).unwrap();
        assert!(before.relation().attributes().is_empty());
        assert_eq!(cat.relation("C").unwrap().relation().attributes().len(), 1);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "relations": [
                { "name": "A", "tuples": 200,
                  "attributes": [ { "name": "a1", "values": 100 }, { "name": "a2", "values": 15 } ] },
                { "name": "B", "tuples": 250 }
            ]
        }"#;
        let cat = Catalogue::from_json(json).unwrap();
        assert_eq!(cat.relation_names(), vec!["A", "B"]);
        assert_eq!(cat.attribute("a2").unwrap().value_count(), 15);
        assert!(cat.relation("B").unwrap().relation().attributes().is_empty());

        assert!(matches!(
            Catalogue::from_json("{ not json"),
            Err(CatalogueError::Definition(_))
        ));
    }
}

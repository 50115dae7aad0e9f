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
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named attribute together with its estimated number of distinct values.
///
/// Two attributes are the same attribute when their names match; the value
/// count is statistics attached to one particular relation snapshot and is
/// ignored by `PartialEq` and `Hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    value_count: u64,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value_count: u64) -> Self {
        Self {
            name: name.into(),
            value_count,
        }
    }

    /// Attribute reference without statistics, used when only the name matters
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_count(&self) -> u64 {
        self.value_count
    }

    /// Same attribute with a different value count
    pub fn with_value_count(&self, value_count: u64) -> Self {
        Self::new(self.name.clone(), value_count)
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Tuple count plus ordered attribute statistics.
///
/// Used both for stored base relations and for the estimated output of a
/// logical operator. Attribute order is append order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    tuple_count: u64,
    attributes: Vec<Attribute>,
}

impl Relation {
    pub fn new(tuple_count: u64) -> Self {
        Self {
            tuple_count,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn tuple_count(&self) -> u64 {
        self.tuple_count
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// First attribute carrying `name`, with the value count of this relation
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name() == name)
    }

    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn contains_all<'a, I>(&self, attributes: I) -> bool
    where
        I: IntoIterator<Item = &'a Attribute>,
    {
        attributes.into_iter().all(|attr| self.contains(attr))
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(Attribute::name).collect()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tuples [", self.tuple_count)?;
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", attr.name(), attr.value_count())?;
        }
        write!(f, "]")
    }
}

/// A stored relation as registered in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRelation {
    name: String,
    relation: Relation,
}

impl NamedRelation {
    pub fn new(name: impl Into<String>, tuple_count: u64) -> Self {
        Self {
            name: name.into(),
            relation: Relation::new(tuple_count),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub(crate) fn add_attribute(&mut self, attribute: Attribute) {
        self.relation.add_attribute(attribute);
    }
}

impl fmt::Display for NamedRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_attribute_equality_ignores_value_count() {
        let a = Attribute::new("a1", 100);
        let b = Attribute::new("a1", 1);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&Attribute::new("a2", 100)));
    }

    #[test]
    fn test_relation_keeps_append_order() {
        let relation = Relation::new(10)
            .with_attribute(Attribute::new("c", 3))
            .with_attribute(Attribute::new("a", 5))
            .with_attribute(Attribute::new("b", 7));
        assert_eq!(relation.attribute_names(), vec!["c", "a", "b"]);
        assert_eq!(relation.attribute("a").map(Attribute::value_count), Some(5));
        assert!(relation.attribute("z").is_none());
    }

    #[test]
    fn test_relation_display() {
        let relation = Relation::new(200)
            .with_attribute(Attribute::new("a1", 100))
            .with_attribute(Attribute::new("a2", 15));
        assert_eq!(relation.to_string(), "200 tuples [a1:100, a2:15]");
    }
}

/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::custom_error::{format_parse_error, PlanError};
use crate::heuristic_optimizer::LogicalOperator;
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while},
    character::complete::{char, digit1, multispace0, multispace1, satisfy},
    combinator::{eof, map, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use shared::{Catalogue, Predicate};

/// Right-hand side of a `WHERE` comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand<'a> {
    Attribute(&'a str),
    Literal(&'a str),
}

/// A single `attr = operand` comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition<'a> {
    pub attribute: &'a str,
    pub operand: Operand<'a>,
}

/// Syntax tree of a query, names still unresolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery<'a> {
    /// `None` for `SELECT *`
    pub projection: Option<Vec<&'a str>>,
    pub relations: Vec<&'a str>,
    pub conditions: Vec<Condition<'a>>,
}

// Helper function to recognize identifiers; they never start with a digit
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

// Parser for a literal value within double or single quotes
pub fn parse_literal(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
    ))(input)
}

// Parser for a bare number such as 5, -3 or 2.5
pub fn parse_number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)
}

// Separator between list items, e.g. `a1, a2`
fn comma(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

// Separator between conditions: a comma or the AND keyword
fn conjunction(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(comma),
        recognize(tuple((multispace1, tag_no_case("AND"), multispace1))),
    ))(input)
}

pub fn parse_select(input: &str) -> IResult<&str, Option<Vec<&str>>> {
    let (input, _) = tag_no_case("SELECT")(input)?;
    let (input, _) = multispace1(input)?;

    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('*')(input) {
        return Ok((input, None));
    }

    let (input, attributes) = separated_list1(comma, identifier)(input)?;
    Ok((input, Some(attributes)))
}

pub fn parse_from(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(
        tuple((multispace1, tag_no_case("FROM"), multispace1)),
        separated_list1(comma, identifier),
    )(input)
}

// Parse a single comparison like a1 = b2 or a2 = "5"
pub fn parse_condition(input: &str) -> IResult<&str, Condition> {
    let (input, attribute) = identifier(input)?;
    let (input, _) = delimited(multispace0, char('='), multispace0)(input)?;
    let (input, operand) = alt((
        map(parse_literal, Operand::Literal),
        map(parse_number, Operand::Literal),
        map(identifier, Operand::Attribute),
    ))(input)?;
    Ok((input, Condition { attribute, operand }))
}

pub fn parse_where(input: &str) -> IResult<&str, Vec<Condition>> {
    let (input, conditions) = opt(preceded(
        tuple((multispace1, tag_no_case("WHERE"), multispace1)),
        separated_list1(conjunction, parse_condition),
    ))(input)?;
    Ok((input, conditions.unwrap_or_default()))
}

/// Parses a complete query, rejecting trailing input
pub fn parse_sql_query(input: &str) -> IResult<&str, ParsedQuery> {
    let (input, _) = multispace0(input)?;
    let (input, projection) = parse_select(input)?;
    let (input, relations) = parse_from(input)?;
    let (input, conditions) = parse_where(input)?;
    let (input, _) = terminated(
        tuple((multispace0, opt(char(';')), multispace0)),
        eof,
    )(input)?;

    Ok((
        input,
        ParsedQuery {
            projection,
            relations,
            conditions,
        },
    ))
}

/// Parses `text` and builds its canonical plan against `catalogue`.
///
/// The canonical plan is a left-deep product of the scans in `FROM` order,
/// one selection per condition with the first condition innermost, and a
/// projection on top unless the query selects `*`.
pub fn parse_query(text: &str, catalogue: &Catalogue) -> Result<LogicalOperator, PlanError> {
    let (_, query) =
        parse_sql_query(text).map_err(|err| PlanError::Parse(format_parse_error(text, err)))?;
    build_canonical_plan(&query, catalogue)
}

pub fn build_canonical_plan(
    query: &ParsedQuery,
    catalogue: &Catalogue,
) -> Result<LogicalOperator, PlanError> {
    let mut relations = query.relations.iter();
    let Some(first) = relations.next() else {
        return Err(PlanError::Parse("query reads no relation".to_string()));
    };

    let mut plan = LogicalOperator::scan(catalogue.relation(first)?);
    for name in relations {
        plan = LogicalOperator::product(plan, LogicalOperator::scan(catalogue.relation(name)?));
    }

    for condition in &query.conditions {
        let attribute = catalogue.attribute(condition.attribute)?;
        let predicate = match condition.operand {
            Operand::Attribute(other) => Predicate::attributes(attribute, catalogue.attribute(other)?),
            Operand::Literal(value) => Predicate::value(attribute, value),
        };
        plan = LogicalOperator::select(plan, predicate);
    }

    if let Some(projection) = &query.projection {
        let attributes = projection
            .iter()
            .map(|name| catalogue.attribute(name))
            .collect::<Result<Vec<_>, _>>()?;
        plan = LogicalOperator::project(plan, attributes);
    }

    Ok(plan)
}

/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use nom::error::Error as NomError;
use shared::CatalogueError;
use thiserror::Error;

/// Errors raised while building, estimating or rewriting a plan
#[derive(Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error("attribute {attribute} is not in the output of {operator}")]
    AttributeNotInOutput {
        attribute: String,
        operator: &'static str,
    },

    #[error("output of {0} read before it was estimated")]
    PrematureRead(&'static str),

    #[error("predicate {0} cannot be satisfied by any product of the plan")]
    PredicateUnsatisfiable(String),

    #[error("join predicate {0} must compare two attributes")]
    NonEquiJoin(String),

    #[error("query syntax error:{0}")]
    Parse(String),
}

impl PlanError {
    pub fn missing_attribute(attribute: &str, operator: &'static str) -> Self {
        PlanError::AttributeNotInOutput {
            attribute: attribute.to_string(),
            operator,
        }
    }
}

pub fn format_parse_error(input: &str, err: nom::Err<NomError<&str>>) -> String {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            if let Some(error_msg) = scan_for_specific_errors(input) {
                return error_msg;
            }

            let error_pos = e.input;
            let error_description = match e.code {
                nom::error::ErrorKind::Tag => ". Expected a keyword or symbol",
                nom::error::ErrorKind::Char => ". Expected a specific character",
                nom::error::ErrorKind::Alt => ". Expected one of several alternatives",
                nom::error::ErrorKind::TakeWhile1 => ". Expected a name",
                nom::error::ErrorKind::Eof => ". Unexpected trailing input",
                _ => "",
            };

            let offset = input.len() - error_pos.len();
            let mut line_no = 1;
            let mut col_no = 1;

            for (i, c) in input.char_indices() {
                if i >= offset {
                    break;
                }
                if c == '\n' {
                    line_no += 1;
                    col_no = 1;
                } else {
                    col_no += 1;
                }
            }

            let lines: Vec<&str> = input.lines().collect();
            let error_line = if line_no <= lines.len() {
                lines[line_no - 1]
            } else {
                "[end of input]"
            };

            format!(
                "\nSyntax error at line {}, column {}{}:\n{}\n{}^ Here\n",
                line_no,
                col_no,
                error_description,
                error_line,
                " ".repeat(col_no - 1)
            )
        }
        nom::Err::Incomplete(_) => {
            "Incomplete input: the parser needs more input to complete parsing".to_string()
        }
    }
}

fn scan_for_specific_errors(input: &str) -> Option<String> {
    if let Some(error_msg) = check_for_missing_clauses(input) {
        return Some(error_msg);
    }

    let lines: Vec<&str> = input.lines().collect();
    if let Some(error_msg) = check_for_unterminated_strings(&lines) {
        return Some(error_msg);
    }

    None
}

fn check_for_missing_clauses(input: &str) -> Option<String> {
    let upper = input.to_uppercase();
    let has_select = upper.split_whitespace().any(|w| w == "SELECT");
    let has_from = upper.split_whitespace().any(|w| w == "FROM");

    if !has_select {
        return Some("\nQuery must start with a 'SELECT' clause.\n".to_string());
    }
    if !has_from {
        return Some("\nFound 'SELECT' but no corresponding 'FROM' clause.\n".to_string());
    }
    None
}

fn check_for_unterminated_strings(lines: &[&str]) -> Option<String> {
    for (line_idx, line) in lines.iter().enumerate() {
        let mut in_string = false;
        let mut string_start = 0;
        for (char_idx, c) in line.char_indices() {
            if c == '"' {
                in_string = !in_string;
                if in_string {
                    string_start = char_idx;
                }
            }
        }
        if in_string {
            return Some(format!(
                "\nUnterminated string literal at line {}:\n{}\n{}^ String not closed\n",
                line_idx + 1,
                line,
                " ".repeat(string_start)
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_line_and_column() {
        let input = "SELECT a1\nFROM A WHERE ?";
        let err = nom::Err::Error(NomError::new(&input[input.len() - 1..], nom::error::ErrorKind::Tag));
        let message = format_parse_error(input, err);
        assert!(message.contains("line 2, column 14"));
        assert!(message.contains("^ Here"));
    }

    #[test]
    fn test_missing_from_clause() {
        let input = "SELECT a1 A";
        let err = nom::Err::Error(NomError::new(&input[10..], nom::error::ErrorKind::Tag));
        assert!(format_parse_error(input, err).contains("no corresponding 'FROM'"));
    }

    #[test]
    fn test_unterminated_string() {
        let input = "SELECT a1 FROM A WHERE a2 = \"5";
        let err = nom::Err::Failure(NomError::new(&input[27..], nom::error::ErrorKind::Char));
        assert!(format_parse_error(input, err).contains("Unterminated string literal"));
    }
}

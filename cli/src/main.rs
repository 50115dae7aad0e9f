/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use flexi_logger::Logger;
use log::info;
use relopt::heuristic_optimizer::{render_plan, Optimiser, OptimizerConfig};
use relopt::parser::parse_query;
use shared::Catalogue;
use std::error::Error;
use std::fs;

#[derive(Parser, Debug)]
#[command(
    name = "relopt-cli",
    version = "0.1.0",
    author = "Volodymyr Kadzhaia <vkadzhaia@gmail.com>, Pieter Bonte <pieter.bonte@kuleuven.be>",
    about = "Estimate and optimise relational query plans",
    long_about = "relopt CLI - Parses a SELECT-FROM-WHERE query against a JSON catalogue of relation statistics, prints the canonical plan with its cardinality estimates, then rewrites it with the heuristic optimiser and prints the result."
)]
struct Args {
    #[arg(short, long, help = "JSON catalogue of relations and attributes", value_name = "FILE")]
    catalogue: String,

    #[arg(short, long, help = "Query string", value_name = "QUERY")]
    query: String,

    #[arg(long, help = "JSON file toggling the rewrite passes", value_name = "FILE")]
    config: Option<String>,

    #[arg(long, default_value = "warn", help = "Log specification, e.g. debug or relopt=trace")]
    log_level: String,

    #[arg(long, help = "Print the optimised output relation as JSON")]
    json: bool,
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let _logger = Logger::try_with_str(&args.log_level)?.log_to_stderr().start()?;

    let catalogue = Catalogue::from_json(&fs::read_to_string(&args.catalogue)?)?;
    info!("loaded relations {:?}", catalogue.relation_names());

    let config = match &args.config {
        Some(path) => OptimizerConfig::from_json(&fs::read_to_string(path)?)?,
        None => OptimizerConfig::default(),
    };

    let plan = parse_query(&args.query, &catalogue)?;
    let optimiser = Optimiser::with_config(config);
    let optimised = optimiser.optimise(&plan)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(optimised.output()?)?);
        return Ok(());
    }

    println!("Canonical plan: {}", plan);
    println!("Cost: {}", optimiser.estimator().plan_cost(&plan)?);
    print!("{}", render_plan(&plan));
    println!();
    println!("Optimised plan: {}", optimised);
    println!("Cost: {}", optimiser.estimator().plan_cost(&optimised)?);
    print!("{}", render_plan(&optimised));
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let args = Args::try_parse_from([
            "relopt-cli",
            "--catalogue",
            "cat.json",
            "--query",
            "SELECT * FROM A",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.catalogue, "cat.json");
        assert_eq!(args.log_level, "warn");
        assert!(args.config.is_none());
        assert!(args.json);
    }

    #[test]
    fn test_query_is_required() {
        assert!(Args::try_parse_from(["relopt-cli", "--catalogue", "cat.json"]).is_err());
    }
}

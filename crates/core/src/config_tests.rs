// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::input::{FileFormat, InputSource};
use std::path::PathBuf;
use yare::parameterized;

fn file_config() -> JobConfig {
    JobConfig::new(
        "word-count",
        InputSource::File {
            path: PathBuf::from("words.txt"),
            format: FileFormat::Lines,
        },
    )
}

#[test]
fn full_toml_document_parses() {
    let config = JobConfig::from_toml(
        r#"
definition = "word-count"
concurrency = 4
max_attempts = 5

[input]
kind = "file"
path = "input.txt"
format = "key_value"

[budget]
max_elapsed = "10m"
max_units = 500

[budget.costs]
record_read = 2
invocation = 3
write = 0
"#,
    )
    .unwrap();

    assert_eq!(config.definition, "word-count");
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.max_attempts, 5);
    assert_eq!(config.budget.max_elapsed, Duration::from_secs(600));
    assert_eq!(config.budget.max_units, 500);
    assert_eq!(
        config.budget.costs,
        UsageCosts {
            record_read: 2,
            invocation: 3,
            write: 0
        }
    );
    assert!(matches!(
        config.input,
        InputSource::File {
            format: FileFormat::KeyValue,
            ..
        }
    ));
    assert!(config.validate().is_ok());
}

#[test]
fn minimal_toml_uses_defaults() {
    let config = JobConfig::from_toml(
        r#"
definition = "dedupe"
[input]
kind = "query"
query = "select * from customer"
"#,
    )
    .unwrap();

    assert_eq!(config.concurrency, 1);
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.budget, BudgetPolicy::default());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = JobConfig::from_toml("definition = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[parameterized(
    zero_concurrency = { file_config().with_concurrency(0), ConfigError::Concurrency(0) },
    too_much_concurrency = { file_config().with_concurrency(65), ConfigError::Concurrency(65) },
    zero_attempts = { file_config().with_max_attempts(0), ConfigError::MaxAttempts },
    zero_units = {
        file_config().with_budget(BudgetPolicy::new(Duration::from_secs(1), 0)),
        ConfigError::BudgetUnits
    },
    zero_elapsed = {
        file_config().with_budget(BudgetPolicy::new(Duration::ZERO, 10)),
        ConfigError::BudgetElapsed
    },
)]
fn invalid_configs_are_rejected(config: JobConfig, expected: ConfigError) {
    assert_eq!(config.validate(), Err(expected));
}

#[test]
fn blank_definition_is_rejected() {
    let config = JobConfig {
        definition: " ".to_string(),
        ..file_config()
    };
    assert_eq!(config.validate(), Err(ConfigError::MissingDefinition));
}

#[test]
fn bad_input_descriptor_surfaces_as_input_error() {
    let config = JobConfig::new(
        "word-count",
        InputSource::Search {
            search_id: String::new(),
            page_size: 10,
        },
    );
    assert!(matches!(config.validate(), Err(ConfigError::Input(_))));
}

#[test]
fn per_invocation_costs_only_charge_invocations() {
    let costs = UsageCosts::per_invocation(7);
    assert_eq!(costs.invocation, 7);
    assert_eq!(costs.record_read, 0);
    assert_eq!(costs.write, 0);
}

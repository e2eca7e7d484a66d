/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Branch name for lines that no rule claims.
pub const UNMATCHED: &str = "unmatched";

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) channel: ChannelConfig,
    pub(crate) rules: Vec<RuleConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    #[serde(default)]
    pub(crate) label: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub(crate) name: String,
    pub(crate) matcher: Matcher,
}

#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Matcher {
    Prefix(String),
    Equals(String),
    Contains(String),
}

impl Matcher {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => line.starts_with(prefix.as_str()),
            Matcher::Equals(expected) => line == expected,
            Matcher::Contains(needle) => line.contains(needle.as_str()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(json5::Error),
    EmptyRuleName { index: usize },
    ReservedRuleName,
    DuplicateRuleName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(err) => write!(f, "unable to read config file: {err}"),
            ConfigError::Parse(err) => write!(f, "unable to parse config file: {err}"),
            ConfigError::EmptyRuleName { index } => write!(f, "rule #{index} has an empty name"),
            ConfigError::ReservedRuleName => {
                write!(f, "rule name `{UNMATCHED}` is reserved for unclaimed lines")
            }
            ConfigError::DuplicateRuleName(name) => write!(f, "rule name `{name}` is used twice"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Read(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = json5::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::EmptyRuleName { index });
            }
            if rule.name == UNMATCHED {
                return Err(ConfigError::ReservedRuleName);
            }
            if !names.insert(rule.name.as_str()) {
                return Err(ConfigError::DuplicateRuleName(rule.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, Matcher};

    #[test]
    fn parses_rules_in_declaration_order() {
        let config = Config::parse(
            r#"{
                channel: { label: "stdin" },
                rules: [
                    { name: "errors", matcher: { kind: "prefix", value: "ERROR" } },
                    { name: "acks", matcher: { kind: "equals", value: "ACK" } },
                ],
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.channel.label.as_deref(), Some("stdin"));
        let names: Vec<_> = config.rules.iter().map(|rule| rule.name.as_str()).collect();
        assert_eq!(names, vec!["errors", "acks"]);
        assert_eq!(config.rules[1].matcher, Matcher::Equals("ACK".to_string()));
    }

    #[test]
    fn channel_section_is_optional() {
        let config = Config::parse("{ rules: [] }").expect("config should parse");

        assert!(config.channel.label.is_none());
        assert!(config.rules.is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Config::parse("{ rules: [], queue_size: 4 }").expect_err("should reject");

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_duplicate_and_reserved_names() {
        let duplicate = Config::parse(
            r#"{ rules: [
                { name: "a", matcher: { kind: "prefix", value: "x" } },
                { name: "a", matcher: { kind: "prefix", value: "y" } },
            ] }"#,
        )
        .expect_err("should reject duplicates");
        assert!(matches!(duplicate, ConfigError::DuplicateRuleName(name) if name == "a"));

        let reserved = Config::parse(
            r#"{ rules: [{ name: "unmatched", matcher: { kind: "contains", value: "x" } }] }"#,
        )
        .expect_err("should reject reserved name");
        assert!(matches!(reserved, ConfigError::ReservedRuleName));

        let empty =
            Config::parse(r#"{ rules: [{ name: " ", matcher: { kind: "equals", value: "x" } }] }"#)
                .expect_err("should reject empty name");
        assert!(matches!(empty, ConfigError::EmptyRuleName { index: 0 }));
    }

    #[test]
    fn matchers_select_lines() {
        assert!(Matcher::Prefix("ERROR".into()).matches("ERROR disk full"));
        assert!(!Matcher::Prefix("ERROR".into()).matches("no ERROR"));
        assert!(Matcher::Equals("ACK".into()).matches("ACK"));
        assert!(!Matcher::Equals("ACK".into()).matches("ACK 1"));
        assert!(Matcher::Contains("warn".into()).matches("a warning"));
    }
}

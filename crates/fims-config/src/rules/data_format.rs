use super::{rule_basics, NetworkFlag, Rule, RuleCheck, RuleContext, RuleLevel, RuleReport};
use crate::config::Config;
use crate::models::{Attribute, DataType, Entity};
use crate::records::RecordSet;
use chrono::format::{parse, Parsed, ParseErrorKind, StrftimeItems};
use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const GROUP: &str = "Invalid DataFormat";

#[allow(clippy::expect_used)]
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d*$").expect("valid regex"));

#[allow(clippy::expect_used)]
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d*\.\d*$").expect("valid regex"));

const ISO_DATE: &str = "%Y-%m-%d";
const ISO_TIME: &str = "%H:%M:%S%.f";
const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Values must match their attribute's data type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidDataTypeFormat {
    #[serde(default = "RuleLevel::error")]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl Default for ValidDataTypeFormat {
    fn default() -> Self {
        Self {
            level: RuleLevel::Error,
            network_rule: NetworkFlag::default(),
        }
    }
}

/// Translate a Joda style pattern (`YYYY-MM-dd`) into a chrono format string
///
/// Single quotes delimit literal text.
pub(crate) fn joda_to_chrono(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != '\'' {
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        i += run;

        let spec = match (c, run) {
            ('y' | 'Y' | 'u', 2) => "%y",
            ('y' | 'Y' | 'u', _) => "%Y",
            ('M', 1 | 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', _) => "%d",
            ('D', _) => "%j",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('H' | 'k', _) => "%H",
            ('h' | 'K', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', _) => "%.f",
            ('a', _) => "%p",
            ('Z' | 'z', _) => "%z",
            _ => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
                continue;
            }
        };

        // Fraction specs consume their own leading dot.
        if spec == "%.f" && out.ends_with('.') {
            out.pop();
        }
        out.push_str(spec);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Whether `value` matches `format`, allowing partial dates such as `%Y`
fn matches_format(value: &str, format: &str) -> bool {
    let mut parsed = Parsed::new();
    if parse(&mut parsed, value, StrftimeItems::new(format)).is_err() {
        return false;
    }
    match parsed.to_naive_date() {
        Ok(_) => true,
        Err(e) => e.kind() == ParseErrorKind::NotEnough,
    }
}

fn is_valid_date(value: &str, attribute: &Attribute) -> bool {
    let iso = match attribute.data_type {
        DataType::Date => ISO_DATE,
        DataType::Time => ISO_TIME,
        _ => ISO_DATETIME,
    };

    attribute
        .data_formats()
        .into_iter()
        .map(joda_to_chrono)
        .any(|f| matches_format(value, &f))
        || matches_format(value, iso)
        || (attribute.data_type == DataType::Datetime && DateTime::parse_from_rfc3339(value).is_ok())
}

fn unknown_suffix(attribute: &Attribute) -> &'static str {
    if attribute.allow_unknown {
        ". Value can also be \"Unknown\""
    } else {
        ""
    }
}

/// Error message for `value` when it does not match `attribute`'s type
fn invalid_value_message(value: &str, attribute: &Attribute) -> Option<String> {
    let unknown = attribute.allow_unknown && attribute.is_unknown_value(value);
    let column = &attribute.column;

    match attribute.data_type {
        DataType::Integer if !(INTEGER.is_match(value) || unknown) => Some(format!(
            "\"{column}\" contains non-integer value \"{value}\"{}",
            unknown_suffix(attribute)
        )),
        DataType::Float if !(INTEGER.is_match(value) || FLOAT.is_match(value) || unknown) => {
            Some(format!(
                "\"{column}\" contains non-float value \"{value}\"{}",
                unknown_suffix(attribute)
            ))
        }
        DataType::Date | DataType::Time | DataType::Datetime
            if !(is_valid_date(value, attribute) || unknown) =>
        {
            Some(format!(
                "\"{column}\" contains invalid date value \"{value}\". Format must be one of [{}]{}",
                attribute.data_format.as_deref().unwrap_or_default(),
                unknown_suffix(attribute)
            ))
        }
        DataType::Boolean
            if !(value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")) =>
        {
            Some(format!(
                "\"{column}\" contains non-boolean value \"{value}\". Must be either true or false"
            ))
        }
        _ => None,
    }
}

impl RuleCheck for ValidDataTypeFormat {
    rule_basics!();

    fn valid_configuration(&self, _: &mut Vec<String>, _: &Entity, _: &Config) -> bool {
        true
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let mut valid = true;
        for (i, record) in record_set.records_to_persist() {
            for attribute in &record_set.entity().attributes {
                let value = record.get(&attribute.uri);
                if value.is_empty() {
                    continue;
                }
                if let Some(message) = invalid_value_message(value, attribute) {
                    valid = false;
                    report.flag(self.level, i);
                    report.add(self.level, GROUP, message);
                }
            }
        }
        valid
    }

    fn merge_rule(&mut self, other: &Rule) -> bool {
        self.network_rule.0 = self.network_rule.0 || other.is_network_rule();
        true
    }

    fn to_project_rule(&self, _: &[String]) -> Option<Rule> {
        Some(self.clone().into())
    }
}

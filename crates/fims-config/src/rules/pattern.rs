use super::{
    rule_basics, valid_column, NetworkFlag, Rule, RuleCheck, RuleContext, RuleLevel, RuleReport,
};
use crate::config::Config;
use crate::models::Entity;
use crate::records::RecordSet;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

const REGEXP_NAME: &str = "RegExp";

/// Anchor `pattern` so it must match the whole value
///
/// The group keeps alternations such as `a|b` from anchoring only one side.
fn anchored(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(case_insensitive)
        .build()
}

/// Values of `column` must match `pattern`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegExp {
    column: String,

    #[serde(default)]
    pattern: String,

    #[serde(default)]
    case_insensitive: bool,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl RegExp {
    pub fn new(
        column: impl Into<String>,
        pattern: impl Into<String>,
        case_insensitive: bool,
        level: RuleLevel,
    ) -> Self {
        Self {
            column: column.into(),
            pattern: pattern.into(),
            case_insensitive,
            level,
            network_rule: NetworkFlag::default(),
        }
    }
}

impl RuleCheck for RegExp {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        let valid = valid_column(REGEXP_NAME, &self.column, messages, entity);
        if self.pattern.is_empty() {
            messages.push(format!(
                "Invalid {REGEXP_NAME} Rule configuration. pattern must not be blank or null."
            ));
            return false;
        }
        if anchored(&self.pattern, self.case_insensitive).is_err() {
            messages.push(format!(
                "Invalid {REGEXP_NAME} Rule configuration. Could not compile pattern \"{}\"",
                self.pattern
            ));
            return false;
        }
        valid
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let Ok(regex) = anchored(&self.pattern, self.case_insensitive) else {
            return false;
        };
        let uri = record_set.entity().attribute_uri(&self.column).unwrap_or_default();

        let mut invalid: Vec<&str> = Vec::new();
        for (i, record) in record_set.records_to_persist() {
            let value = record.get(uri);
            if value.is_empty() || regex.is_match(value) {
                continue;
            }
            report.flag(self.level, i);
            if !invalid.contains(&value) {
                invalid.push(value);
            }
        }

        for value in &invalid {
            report.add(
                self.level,
                "Value constraint did not pass",
                format!(
                    "Value \"{value}\" in column \"{}\" does not match the pattern \"{}\"",
                    self.column, self.pattern
                ),
            );
        }
        invalid.is_empty()
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        columns.contains(&self.column).then(|| self.clone().into())
    }
}

#[allow(clippy::expect_used)]
static URI_SAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9+=:._()~*]+$").expect("valid regex"));

/// Values of `column` may only hold characters safe for identifier URIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidForUri {
    column: String,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl ValidForUri {
    pub fn new(column: impl Into<String>, level: RuleLevel) -> Self {
        Self {
            column: column.into(),
            level,
            network_rule: NetworkFlag::default(),
        }
    }
}

impl RuleCheck for ValidForUri {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        valid_column("ValidForURI", &self.column, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let uri = record_set.entity().attribute_uri(&self.column).unwrap_or_default();

        // stored records are checked too; no single record is marked
        let invalid: Vec<&str> = record_set
            .records()
            .iter()
            .map(|r| r.get(uri))
            .filter(|value| !URI_SAFE.is_match(value))
            .collect();

        if invalid.is_empty() {
            return true;
        }
        report.add(
            self.level,
            "Non-valid URI characters",
            format!(
                "\"{}\" contains some invalid URI characters: \"{}\"",
                self.column,
                invalid.join("\", \"")
            ),
        );
        false
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        columns.contains(&self.column).then(|| self.clone().into())
    }
}

/// Values of `column` must be http(s) URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidUrl {
    column: String,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl ValidUrl {
    pub fn new(column: impl Into<String>, level: RuleLevel) -> Self {
        Self {
            column: column.into(),
            level,
            network_rule: NetworkFlag::default(),
        }
    }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}

impl RuleCheck for ValidUrl {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        valid_column("ValidURL", &self.column, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let uri = record_set.entity().attribute_uri(&self.column).unwrap_or_default();

        let mut valid = true;
        for (i, record) in record_set.records_to_persist() {
            let value = record.get(uri);
            if value.is_empty() || is_http_url(value) {
                continue;
            }
            valid = false;
            report.flag(self.level, i);
            report.add(
                self.level,
                "Invalid URL",
                format!("\"{value}\" is not a valid URL for \"{}\"", self.column),
            );
        }
        valid
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        columns.contains(&self.column).then(|| self.clone().into())
    }
}

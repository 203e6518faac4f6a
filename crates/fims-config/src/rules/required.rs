use super::{
    rule_basics, valid_columns, NetworkFlag, Rule, RuleCheck, RuleContext, RuleLevel, RuleReport,
};
use crate::config::Config;
use crate::models::Entity;
use crate::records::RecordSet;
use serde::{Deserialize, Serialize};

const NAME: &str = "RequiredValue";
const GROUP: &str = "Missing column(s)";

fn push_unique(columns: &mut Vec<String>, column: String) {
    if !columns.contains(&column) {
        columns.push(column);
    }
}

/// Every listed column must have a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredValue {
    columns: Vec<String>,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl RequiredValue {
    pub fn new(columns: impl IntoIterator<Item = String>, level: RuleLevel) -> Self {
        let mut rule = Self {
            columns: Vec::new(),
            level,
            network_rule: NetworkFlag::default(),
        };
        for column in columns {
            rule.add_column(column);
        }
        rule
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn add_column(&mut self, column: impl Into<String>) {
        push_unique(&mut self.columns, column.into());
    }

    pub(crate) fn contains(&self, other: &RequiredValue) -> bool {
        self.level == other.level && other.columns.iter().all(|c| self.columns.contains(c))
    }
}

impl RuleCheck for RequiredValue {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        valid_columns(NAME, &self.columns, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let entity = record_set.entity();
        let mut remaining: Vec<(&str, &str)> = self
            .columns
            .iter()
            .filter_map(|c| entity.attribute_uri(c).map(|uri| (c.as_str(), uri)))
            .collect();
        let mut missing: Vec<&str> = Vec::new();

        for (i, record) in record_set.records_to_persist() {
            remaining.retain(|(column, uri)| {
                if record.get(uri).is_empty() {
                    report.flag(self.level, i);
                    missing.push(*column);
                    false
                } else {
                    true
                }
            });
            if remaining.is_empty() {
                break;
            }
        }

        for column in &missing {
            report.add(self.level, GROUP, format!("\"{column}\" has a missing cell value"));
        }
        missing.is_empty()
    }

    fn merge_rule(&mut self, other: &Rule) -> bool {
        let Rule::RequiredValue(other) = other else {
            return false;
        };
        if other.level != self.level {
            return false;
        }
        for column in &other.columns {
            push_unique(&mut self.columns, column.clone());
        }
        self.network_rule.0 = self.network_rule.0 && other.network_rule.0;
        true
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        if self.level == RuleLevel::Error {
            return Some(self.clone().into());
        }
        let mut rule = self.clone();
        rule.columns.retain(|c| columns.contains(c));
        Some(rule.into())
    }
}

const GROUP_NAME: &str = "RequiredValueInGroup";
const GROUP_MESSAGE: &str = "Missing column from group";

/// At least one of the listed columns must have a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredValueInGroup {
    columns: Vec<String>,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl RequiredValueInGroup {
    pub fn new(columns: impl IntoIterator<Item = String>, level: RuleLevel) -> Self {
        let mut unique = Vec::new();
        for column in columns {
            push_unique(&mut unique, column);
        }
        Self {
            columns: unique,
            level,
            network_rule: NetworkFlag::default(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl RuleCheck for RequiredValueInGroup {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        valid_columns(GROUP_NAME, &self.columns, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let entity = record_set.entity();
        let key_column = entity.unique_key().unwrap_or_default();
        let key_uri = entity.unique_key_uri().unwrap_or_default();
        let uris: Vec<&str> = self
            .columns
            .iter()
            .filter_map(|c| entity.attribute_uri(c))
            .collect();
        let columns = format!("[\"{}\"]", self.columns.join("\",\""));

        let mut valid = true;
        for (i, record) in record_set.records_to_persist() {
            if uris.iter().any(|uri| !record.get(uri).is_empty()) {
                continue;
            }
            valid = false;
            report.flag(self.level, i);
            report.add(
                self.level,
                GROUP_MESSAGE,
                format!(
                    "row with {key_column}={} must have a value in at least 1 of the columns: {columns}",
                    record.get(key_uri)
                ),
            );
        }
        valid
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        let mut rule = self.clone();
        rule.columns.retain(|c| columns.contains(c));
        if rule.columns.is_empty() {
            None
        } else {
            Some(rule.into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;
    use pretty_assertions::assert_eq;

    fn required(columns: &[&str], level: RuleLevel) -> Rule {
        RequiredValue::new(columns.iter().map(|c| c.to_string()), level).into()
    }

    #[test]
    fn test_reports_each_missing_column_once() {
        let e = entity(&["eventID", "col2", "col3"]);
        let set = RecordSet::with_records(
            e,
            vec![
                record(&[("eventID", "1"), ("col2", "")]),
                record(&[("eventID", ""), ("col2", "")]),
                record(&[("eventID", "3"), ("col2", "x"), ("col3", "y")]),
            ],
            false,
        );

        let (passed, messages, flagged) = run(
            &required(&["eventID", "col2"], RuleLevel::Error),
            &set,
            &Config::default(),
        );

        assert!(!passed);
        assert_eq!(
            texts(&messages, true),
            vec![
                "\"col2\" has a missing cell value".to_string(),
                "\"eventID\" has a missing cell value".to_string()
            ]
        );
        assert_eq!(messages.errors[0].name, "Missing column(s)");
        assert_eq!(flagged, vec![0, 1]);
    }

    #[test]
    fn test_warning_level_does_not_flag_records() {
        let set = RecordSet::with_records(
            entity(&["eventID", "col2"]),
            vec![record(&[("eventID", "1")])],
            false,
        );
        let (passed, messages, flagged) =
            run(&required(&["col2"], RuleLevel::Warning), &set, &Config::default());

        assert!(!passed);
        assert!(flagged.is_empty());
        assert_eq!(texts(&messages, false).len(), 1);
    }

    #[test]
    fn test_stored_records_are_not_checked() {
        let set = RecordSet::with_records(
            entity(&["eventID"]),
            vec![record(&[("eventID", "")]).stored()],
            false,
        );
        let (passed, _, _) = run(&required(&["eventID"], RuleLevel::Error), &set, &Config::default());
        assert!(passed);
    }

    #[test]
    fn test_merge_ands_network_flag() {
        let mut a = required(&["a"], RuleLevel::Error);
        a.set_network_rule(true);
        let b = required(&["b"], RuleLevel::Error);
        assert!(a.merge_rule(&b));
        assert!(!a.is_network_rule());
    }

    #[test]
    fn test_to_project_rule_filters_warning_columns() {
        let columns = vec!["a".to_string()];
        let warning = required(&["a", "b"], RuleLevel::Warning);
        assert_eq!(warning.to_project_rule(&columns), Some(required(&["a"], RuleLevel::Warning)));

        let error = required(&["a", "b"], RuleLevel::Error);
        assert_eq!(error.to_project_rule(&columns), Some(error.clone()));
    }

    #[test]
    fn test_required_value_in_group() {
        let set = RecordSet::with_records(
            entity(&["eventID", "a", "b"]),
            vec![
                record(&[("eventID", "1"), ("b", "x")]),
                record(&[("eventID", "2")]),
            ],
            false,
        );
        let rule: Rule =
            RequiredValueInGroup::new(vec!["a".to_string(), "b".to_string()], RuleLevel::Warning)
                .into();
        let (passed, messages, _) = run(&rule, &set, &Config::default());

        assert!(!passed);
        assert_eq!(
            texts(&messages, false),
            vec!["row with eventID=2 must have a value in at least 1 of the columns: [\"a\",\"b\"]"
                .to_string()]
        );
    }
}

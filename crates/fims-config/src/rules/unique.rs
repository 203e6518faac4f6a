use super::{
    rule_basics, valid_column, valid_columns, NetworkFlag, Rule, RuleCheck, RuleContext,
    RuleLevel, RuleReport,
};
use crate::config::Config;
use crate::models::Entity;
use crate::records::{Record, RecordSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const GROUP: &str = "Unique value constraint did not pass";

/// Values of `column` must not repeat within the expedition, or within the
/// whole project when `uniqueAcrossProject` is set. Blank values are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValue {
    column: String,

    #[serde(default)]
    unique_across_project: bool,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl UniqueValue {
    pub fn new(column: impl Into<String>, unique_across_project: bool, level: RuleLevel) -> Self {
        Self {
            column: column.into(),
            unique_across_project,
            level,
            network_rule: NetworkFlag::default(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn unique_across_project(&self) -> bool {
        self.unique_across_project
    }
}

/// Records a uniqueness rule looks at
fn records_in_scope(record_set: &RecordSet, across_project: bool) -> Vec<(usize, &Record)> {
    if !record_set.has_record_to_persist() {
        return Vec::new();
    }
    let expedition = record_set.expedition_code();
    record_set
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| across_project || r.expedition_code() == expedition)
        .collect()
}

impl RuleCheck for UniqueValue {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        valid_column("UniqueValue", &self.column, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let uri = record_set.entity().attribute_uri(&self.column).unwrap_or_default();

        let mut seen = HashSet::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for (i, record) in records_in_scope(record_set, self.unique_across_project) {
            let value = record.get(uri);
            if value.is_empty() || seen.insert(value) {
                continue;
            }
            if record.persist() {
                report.flag(self.level, i);
            }
            if !duplicates.contains(&value) {
                duplicates.push(value);
            }
        }

        if duplicates.is_empty() {
            return true;
        }

        let scope = if self.unique_across_project {
            "across the entire project "
        } else {
            ""
        };
        report.add(
            self.level,
            GROUP,
            format!(
                "\"{}\" column is defined as unique {scope}but some values used more than once: \"{}\"",
                self.column,
                duplicates.join("\", \"")
            ),
        );
        false
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        columns.contains(&self.column).then(|| self.clone().into())
    }
}

/// The combination of `columns` must not repeat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeUniqueValue {
    columns: Vec<String>,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl CompositeUniqueValue {
    pub fn new(columns: Vec<String>, level: RuleLevel) -> Self {
        Self {
            columns,
            level,
            network_rule: NetworkFlag::default(),
        }
    }
}

impl RuleCheck for CompositeUniqueValue {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        valid_columns("CompositeUniqueValue", &self.columns, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let entity = record_set.entity();
        let uris: Vec<&str> = self
            .columns
            .iter()
            .map(|c| entity.attribute_uri(c).unwrap_or_default())
            .collect();

        let mut seen = HashSet::new();
        let mut duplicates: Vec<Vec<&str>> = Vec::new();
        for (i, record) in records_in_scope(record_set, false) {
            let composite: Vec<&str> = uris.iter().map(|uri| record.get(uri)).collect();
            if composite.iter().all(|v| v.is_empty()) || seen.insert(composite.clone()) {
                continue;
            }
            if record.persist() {
                report.flag(self.level, i);
            }
            if !duplicates.contains(&composite) {
                duplicates.push(composite);
            }
        }

        if duplicates.is_empty() {
            return true;
        }

        let values: Vec<String> = duplicates.iter().map(|d| d.join("\", \"")).collect();
        report.add(
            self.level,
            GROUP,
            format!(
                "(\"{}\") is defined as a composite unique key, but some value combinations were used more than once: (\"{}\")",
                self.columns.join("\", \""),
                values.join("\"), (\"")
            ),
        );
        false
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        self.columns
            .iter()
            .all(|c| columns.contains(c))
            .then(|| self.clone().into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_values_in_expedition() {
        let set = RecordSet::with_records(
            entity(&["eventID"]),
            vec![
                record(&[("eventID", "1")]),
                record(&[("eventID", "1")]),
                record(&[("eventID", "")]),
                record(&[("eventID", "")]),
                record(&[("eventID", "2")]),
            ],
            false,
        );
        let rule: Rule = UniqueValue::new("eventID", false, RuleLevel::Error).into();
        let (passed, messages, flagged) = run(&rule, &set, &Config::default());

        assert!(!passed);
        assert_eq!(
            texts(&messages, true),
            vec!["\"eventID\" column is defined as unique but some values used more than once: \"1\"".to_string()]
        );
        assert_eq!(flagged, vec![1]);
    }

    #[test]
    fn test_other_expeditions_only_count_across_project() {
        let mut stored = record(&[("eventID", "1")]).stored();
        stored.set_expedition_code("other");
        let set = RecordSet::with_records(
            entity(&["eventID"]),
            vec![record(&[("eventID", "1")]), stored],
            false,
        );

        let within: Rule = UniqueValue::new("eventID", false, RuleLevel::Error).into();
        assert!(run(&within, &set, &Config::default()).0);

        let across: Rule = UniqueValue::new("eventID", true, RuleLevel::Error).into();
        let (passed, messages, _) = run(&across, &set, &Config::default());
        assert!(!passed);
        assert_eq!(
            texts(&messages, true),
            vec!["\"eventID\" column is defined as unique across the entire project but some values used more than once: \"1\"".to_string()]
        );
    }

    #[test]
    fn test_composite_unique_value() {
        let set = RecordSet::with_records(
            entity(&["eventID", "a", "b"]),
            vec![
                record(&[("eventID", "1"), ("a", "x"), ("b", "y")]),
                record(&[("eventID", "2"), ("a", "x"), ("b", "y")]),
                record(&[("eventID", "3"), ("a", "x"), ("b", "z")]),
            ],
            false,
        );
        let rule: Rule =
            CompositeUniqueValue::new(vec!["a".into(), "b".into()], RuleLevel::Warning).into();
        let (passed, messages, _) = run(&rule, &set, &Config::default());

        assert!(!passed);
        assert_eq!(
            texts(&messages, false),
            vec!["(\"a\", \"b\") is defined as a composite unique key, but some value combinations were used more than once: (\"x\", \"y\")".to_string()]
        );
    }
}

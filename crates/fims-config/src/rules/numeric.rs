use super::{
    entity_has_attribute, rule_basics, valid_column, NetworkFlag, Rule, RuleCheck, RuleContext,
    RuleLevel, RuleReport,
};
use crate::config::Config;
use crate::models::Entity;
use crate::records::RecordSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MIN_MAX_NAME: &str = "MinMaxNumber";
const MIN_MAX_GROUP: &str = "Number outside of range";

#[allow(clippy::expect_used)]
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+.?\d*|.\d+)$").expect("valid regex"));

/// `minimumColumn` must not exceed `maximumColumn`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinMaxNumber {
    #[serde(default)]
    minimum_column: String,

    #[serde(default)]
    maximum_column: String,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl MinMaxNumber {
    pub fn new(
        minimum_column: impl Into<String>,
        maximum_column: impl Into<String>,
        level: RuleLevel,
    ) -> Self {
        Self {
            minimum_column: minimum_column.into(),
            maximum_column: maximum_column.into(),
            level,
            network_rule: NetworkFlag::default(),
        }
    }
}

impl RuleCheck for MinMaxNumber {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        if self.minimum_column.trim().is_empty() || self.maximum_column.trim().is_empty() {
            messages.push(
                "Invalid MinMaxNumber Rule configuration. minimumColumn and maximumColumn must not be null or empty"
                    .to_string(),
            );
            return false;
        }
        entity_has_attribute(MIN_MAX_NAME, &self.minimum_column, messages, entity)
            && entity_has_attribute(MIN_MAX_NAME, &self.maximum_column, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let entity = record_set.entity();
        let min_uri = entity.attribute_uri(&self.minimum_column).unwrap_or_default();
        let max_uri = entity.attribute_uri(&self.maximum_column).unwrap_or_default();

        let mut valid = true;
        for (i, record) in record_set.records_to_persist() {
            let min = record.get(min_uri);
            let max = record.get(max_uri);
            if min.is_empty() && max.is_empty() {
                continue;
            }

            let mut numbers = true;
            for (value, column) in [(min, &self.minimum_column), (max, &self.maximum_column)] {
                if !value.is_empty() && !NUMBER.is_match(value) {
                    report.add(
                        self.level,
                        MIN_MAX_GROUP,
                        format!("non-numeric value \"{value}\" for column \"{column}\""),
                    );
                    numbers = false;
                }
            }

            if !numbers {
                valid = false;
                report.flag(self.level, i);
                continue;
            }
            if min.is_empty() || max.is_empty() {
                continue;
            }

            match (min.parse::<f64>(), max.parse::<f64>()) {
                (Ok(lo), Ok(hi)) if lo > hi => {
                    valid = false;
                    report.flag(self.level, i);
                    report.add(
                        self.level,
                        MIN_MAX_GROUP,
                        format!(
                            "Illegal values! {} = {min} while {} = {max}",
                            self.minimum_column, self.maximum_column
                        ),
                    );
                }
                (Ok(_), Ok(_)) => {}
                _ => report.add(
                    self.level,
                    MIN_MAX_GROUP,
                    format!(
                        "could not determine if \"{min}\" is greater then \"{max}\". Are they both numbers?"
                    ),
                ),
            }
        }
        valid
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        (columns.contains(&self.minimum_column) && columns.contains(&self.maximum_column))
            .then(|| self.clone().into())
    }
}

const RANGE_NAME: &str = "NumericRange";
const RANGE_GROUP: &str = "Invalid number format";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    GreaterOrEqual(f64),
    LessOrEqual(f64),
    Greater(f64),
    Less(f64),
}

impl Bound {
    fn allows(self, value: f64) -> bool {
        match self {
            Bound::GreaterOrEqual(b) => value >= b,
            Bound::LessOrEqual(b) => value <= b,
            Bound::Greater(b) => value > b,
            Bound::Less(b) => value < b,
        }
    }
}

/// Parse a range such as `>=0|<=100`
fn parse_range(range: &str) -> Option<Vec<Bound>> {
    range
        .split('|')
        .map(|part| {
            let part = part.trim();
            let (ctor, rest): (fn(f64) -> Bound, &str) = if let Some(r) = part.strip_prefix(">=") {
                (Bound::GreaterOrEqual, r)
            } else if let Some(r) = part.strip_prefix("<=") {
                (Bound::LessOrEqual, r)
            } else if let Some(r) = part.strip_prefix('>') {
                (Bound::Greater, r)
            } else if let Some(r) = part.strip_prefix('<') {
                (Bound::Less, r)
            } else {
                return None;
            };
            rest.trim().parse::<f64>().ok().map(ctor)
        })
        .collect()
}

/// Numeric values of `column` must satisfy every bound in `range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    column: String,

    #[serde(default)]
    range: String,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl NumericRange {
    pub fn new(column: impl Into<String>, range: impl Into<String>, level: RuleLevel) -> Self {
        Self {
            column: column.into(),
            range: range.into(),
            level,
            network_rule: NetworkFlag::default(),
        }
    }
}

impl RuleCheck for NumericRange {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        let valid = valid_column(RANGE_NAME, &self.column, messages, entity);
        if self.range.trim().is_empty() {
            messages.push(format!(
                "Invalid {RANGE_NAME} Rule configuration. range must not be blank or null."
            ));
            return false;
        }
        if parse_range(&self.range).is_none() {
            messages.push(format!(
                "Invalid {RANGE_NAME} Rule configuration. Could not parse range \"{}\"",
                self.range
            ));
            return false;
        }
        valid
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let Some(bounds) = parse_range(&self.range) else {
            return false;
        };
        let entity = record_set.entity();
        let uri = entity.attribute_uri(&self.column).unwrap_or_default();
        let allow_unknown = entity
            .attribute(&self.column)
            .map(|a| a.allow_unknown)
            .unwrap_or(false);

        let mut valid = true;
        for (i, record) in record_set.records_to_persist() {
            let value = record.get(uri);
            if value.is_empty() {
                continue;
            }
            let ok = match value.parse::<f64>() {
                Ok(n) => bounds.iter().all(|b| b.allows(n)),
                Err(_) => allow_unknown && value.eq_ignore_ascii_case("unknown"),
            };
            if !ok {
                valid = false;
                report.flag(self.level, i);
                report.add(
                    self.level,
                    RANGE_GROUP,
                    format!(
                        "Value \"{value}\" out of range for \"{}\" using range validation = \"{}\"",
                        self.column, self.range
                    ),
                );
            }
        }
        valid
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        columns.contains(&self.column).then(|| self.clone().into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range(">=0 | <100"),
            Some(vec![Bound::GreaterOrEqual(0.0), Bound::Less(100.0)])
        );
        assert_eq!(parse_range("=5"), None);
        assert_eq!(parse_range(">abc"), None);
    }

    #[test]
    fn test_min_max() {
        let set = RecordSet::with_records(
            entity(&["eventID", "min", "max"]),
            vec![
                record(&[("eventID", "1"), ("min", "1"), ("max", "2")]),
                record(&[("eventID", "2"), ("min", "5"), ("max", "2")]),
                record(&[("eventID", "3"), ("min", "abc")]),
                record(&[("eventID", "4")]),
            ],
            false,
        );
        let rule: Rule = MinMaxNumber::new("min", "max", RuleLevel::Warning).into();
        let (passed, messages, _) = run(&rule, &set, &Config::default());

        assert!(!passed);
        assert_eq!(
            texts(&messages, false),
            vec![
                "Illegal values! min = 5 while max = 2".to_string(),
                "non-numeric value \"abc\" for column \"min\"".to_string()
            ]
        );
    }

    #[test]
    fn test_min_max_invalid_configuration() {
        let e = entity(&["eventID", "min"]);
        let mut messages = Vec::new();
        let rule = MinMaxNumber::new("min", "", RuleLevel::Warning);
        assert!(!rule.valid_configuration(&mut messages, &e, &Config::default()));
        assert_eq!(
            messages,
            vec!["Invalid MinMaxNumber Rule configuration. minimumColumn and maximumColumn must not be null or empty".to_string()]
        );
    }

    #[test]
    fn test_numeric_range() {
        let mut e = entity(&["eventID", "depth"]);
        e.attributes[1].allow_unknown = true;
        let set = RecordSet::with_records(
            e,
            vec![
                record(&[("eventID", "1"), ("depth", "10")]),
                record(&[("eventID", "2"), ("depth", "-1")]),
                record(&[("eventID", "3"), ("depth", "Unknown")]),
                record(&[("eventID", "4"), ("depth", "deep")]),
            ],
            false,
        );
        let rule: Rule = NumericRange::new("depth", ">=0|<=100", RuleLevel::Error).into();
        let (passed, messages, flagged) = run(&rule, &set, &Config::default());

        assert!(!passed);
        assert_eq!(
            texts(&messages, true),
            vec![
                "Value \"-1\" out of range for \"depth\" using range validation = \">=0|<=100\"".to_string(),
                "Value \"deep\" out of range for \"depth\" using range validation = \">=0|<=100\"".to_string()
            ]
        );
        assert_eq!(flagged, vec![1, 3]);
    }

    #[test]
    fn test_unparseable_range() {
        let e = entity(&["eventID", "depth"]);
        let mut messages = Vec::new();
        let rule = NumericRange::new("depth", "between 1 and 2", RuleLevel::Warning);
        assert!(!rule.valid_configuration(&mut messages, &e, &Config::default()));
        assert_eq!(
            messages,
            vec!["Invalid NumericRange Rule configuration. Could not parse range \"between 1 and 2\"".to_string()]
        );
    }
}

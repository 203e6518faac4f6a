use super::{
    entity_has_attribute, rule_basics, valid_column, NetworkFlag, Rule, RuleCheck, RuleContext,
    RuleLevel, RuleReport,
};
use crate::config::Config;
use crate::models::Entity;
use crate::records::RecordSet;
use serde::{Deserialize, Serialize};

const NAME: &str = "RequireValueIfOtherColumn";

/// `column` must have a value whenever `otherColumn` does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequireValueIfOtherColumn {
    column: String,

    #[serde(default)]
    other_column: String,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl RequireValueIfOtherColumn {
    pub fn new(column: impl Into<String>, other_column: impl Into<String>, level: RuleLevel) -> Self {
        Self {
            column: column.into(),
            other_column: other_column.into(),
            level,
            network_rule: NetworkFlag::default(),
        }
    }
}

impl RuleCheck for RequireValueIfOtherColumn {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, _: &Config) -> bool {
        let valid = valid_column(NAME, &self.column, messages, entity);
        if self.other_column.trim().is_empty() {
            messages.push(format!(
                "Invalid {NAME} Rule configuration. otherColumn must not be blank or null."
            ));
            return false;
        }
        valid && entity_has_attribute(NAME, &self.other_column, messages, entity)
    }

    fn check(&self, record_set: &RecordSet, _: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let entity = record_set.entity();
        let uri = entity.attribute_uri(&self.column).unwrap_or_default();
        let other_uri = entity.attribute_uri(&self.other_column).unwrap_or_default();

        let mut valid = true;
        for (i, record) in record_set.records_to_persist() {
            let other = record.get(other_uri);
            if other.is_empty() || !record.get(uri).is_empty() {
                continue;
            }
            valid = false;
            report.flag(self.level, i);
            report.add(
                self.level,
                "Dependent column value check",
                format!(
                    "\"{}\" has value \"{other}\", but associated column \"{}\" has no value",
                    self.other_column, self.column
                ),
            );
        }
        valid
    }

    /// ERROR rules apply when either column is used, warnings only when both are
    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        let has_column = columns.contains(&self.column);
        let has_other = columns.contains(&self.other_column);
        let applies = match self.level {
            RuleLevel::Error => has_column || has_other,
            RuleLevel::Warning => has_column && has_other,
        };
        applies.then(|| self.clone().into())
    }
}

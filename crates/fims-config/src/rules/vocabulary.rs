use super::{
    rule_basics, valid_column, NetworkFlag, Rule, RuleCheck, RuleContext, RuleLevel, RuleReport,
};
use crate::config::Config;
use crate::models::Entity;
use crate::records::RecordSet;
use serde::{Deserialize, Serialize};

const NAME: &str = "ControlledVocabulary";
const GROUP: &str = "Unapproved value(s)";

/// Values of `column` must come from the config list `listName`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlledVocabulary {
    column: String,

    #[serde(default)]
    list_name: String,

    #[serde(default)]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl ControlledVocabulary {
    pub fn new(column: impl Into<String>, list_name: impl Into<String>, level: RuleLevel) -> Self {
        Self {
            column: column.into(),
            list_name: list_name.into(),
            level,
            network_rule: NetworkFlag::default(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn list_name(&self) -> &str {
        &self.list_name
    }
}

impl RuleCheck for ControlledVocabulary {
    rule_basics!();

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, config: &Config) -> bool {
        let valid = valid_column(NAME, &self.column, messages, entity);

        if self.list_name.trim().is_empty() {
            messages.push(format!(
                "Invalid {NAME} Rule configuration. listName must not be blank or null."
            ));
            return false;
        }

        if config.find_list(&self.list_name).is_none() {
            messages.push(format!(
                "Invalid Project configuration. Could not find list with name \"{}\"",
                self.list_name
            ));
            return false;
        }

        valid
    }

    fn check(&self, record_set: &RecordSet, ctx: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let Some(list) = ctx.config.find_list(&self.list_name) else {
            return false;
        };
        let uri = record_set.entity().attribute_uri(&self.column).unwrap_or_default();

        let fields: Vec<String> = list
            .fields
            .iter()
            .map(|f| {
                if list.case_insensitive {
                    f.value.to_lowercase()
                } else {
                    f.value.clone()
                }
            })
            .collect();

        let mut invalid: Vec<&str> = Vec::new();
        for (i, record) in record_set.records_to_persist() {
            let value = record.get(uri);
            if value.is_empty() {
                continue;
            }
            let candidate = if list.case_insensitive {
                value.to_lowercase()
            } else {
                value.to_string()
            };
            if !fields.contains(&candidate) {
                report.flag(self.level, i);
                if !invalid.contains(&value) {
                    invalid.push(value);
                }
            }
        }

        for value in &invalid {
            report.add(
                self.level,
                GROUP,
                format!(
                    "\"{value}\" in column \"{}\" not in list \"{}\"",
                    self.column, self.list_name
                ),
            );
        }
        invalid.is_empty()
    }

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        columns.contains(&self.column).then(|| self.clone().into())
    }
}

use super::{rule_basics, NetworkFlag, Rule, RuleCheck, RuleContext, RuleLevel, RuleReport};
use crate::config::Config;
use crate::models::Entity;
use crate::records::RecordSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Every child record must reference an existing parent record of the same
/// expedition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidParentIdentifiers {
    #[serde(default = "RuleLevel::error")]
    level: RuleLevel,

    #[serde(skip)]
    network_rule: NetworkFlag,
}

impl Default for ValidParentIdentifiers {
    fn default() -> Self {
        Self {
            level: RuleLevel::Error,
            network_rule: NetworkFlag::default(),
        }
    }
}

impl RuleCheck for ValidParentIdentifiers {
    rule_basics!();

    fn valid_configuration(&self, _: &mut Vec<String>, _: &Entity, _: &Config) -> bool {
        true
    }

    fn check(&self, record_set: &RecordSet, ctx: &RuleContext<'_>, report: &mut RuleReport<'_>) -> bool {
        let entity = record_set.entity();
        let Some(parent_alias) = entity.parent_entity.as_deref().filter(|_| entity.is_child_entity())
        else {
            return true;
        };

        let expedition = record_set.expedition_code();
        let (uri, parent_identifiers): (&str, HashSet<&str>) = match ctx.parent {
            Some(parent) => {
                let key_uri = parent.entity().unique_key_uri().unwrap_or_default();
                let ids = parent
                    .records()
                    .iter()
                    .filter(|r| r.expedition_code() == expedition)
                    .map(|r| r.get(key_uri))
                    .collect();
                let uri = parent
                    .entity()
                    .unique_key()
                    .and_then(|column| entity.attribute_uri(column))
                    .unwrap_or_default();
                (uri, ids)
            }
            None => ("", HashSet::new()),
        };

        let mut invalid: Vec<&str> = Vec::new();
        for (i, record) in record_set.records_to_persist() {
            let value = record.get(uri);
            if value.is_empty() || !parent_identifiers.contains(value) {
                report.flag(self.level, i);
                invalid.push(value);
            }
        }

        if invalid.is_empty() {
            return true;
        }
        report.add(
            self.level,
            "Invalid parent identifier(s)",
            format!(
                "The following identifiers do not exist in the parent entity \"{parent_alias}\": [\"{}\"]",
                invalid.join("\", \"")
            ),
        );
        false
    }

    fn merge_rule(&mut self, other: &Rule) -> bool {
        self.network_rule.0 = self.network_rule.0 || other.is_network_rule();
        true
    }

    fn to_project_rule(&self, _: &[String]) -> Option<Rule> {
        Some(self.clone().into())
    }
}

//! Record validation rules
//!
//! Every rule is a variant of [`Rule`], serialized with a `name` tag:
//!
//! ```
//! use fims_config::rules::{Rule, RuleLevel};
//!
//! let rule: Rule = serde_json::from_str(
//!     r#"{"name": "RequiredValue", "columns": ["eventID"], "level": "ERROR"}"#,
//! ).unwrap();
//! assert_eq!(rule.name(), "RequiredValue");
//! assert_eq!(rule.level(), RuleLevel::Error);
//! ```

mod data_format;
mod dependent;
mod numeric;
mod parent;
mod pattern;
mod required;
mod unique;
mod vocabulary;

pub use data_format::ValidDataTypeFormat;
pub use dependent::RequireValueIfOtherColumn;
pub use numeric::{MinMaxNumber, NumericRange};
pub use parent::ValidParentIdentifiers;
pub use pattern::{RegExp, ValidForUri, ValidUrl};
pub use required::{RequiredValue, RequiredValueInGroup};
pub use unique::{CompositeUniqueValue, UniqueValue};
pub use vocabulary::ControlledVocabulary;

use crate::config::Config;
use crate::models::Entity;
use crate::records::RecordSet;
use crate::validation::{EntityMessages, Message};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::discriminant;

/// Group used when a rule cannot run because it is misconfigured
pub const INVALID_RULE_CONFIGURATION_GROUP: &str =
    "Invalid Rule Configuration. Contact Project Administrator.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleLevel {
    Error,
    #[default]
    Warning,
}

impl RuleLevel {
    pub(crate) fn error() -> Self {
        RuleLevel::Error
    }
}

impl fmt::Display for RuleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleLevel::Error => f.write_str("ERROR"),
            RuleLevel::Warning => f.write_str("WARNING"),
        }
    }
}

/// Marks a rule inherited from the network config
///
/// Provenance never takes part in rule equality and is not serialized.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFlag(pub bool);

impl PartialEq for NetworkFlag {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// What a rule may consult while running
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub config: &'a Config,
    /// Record set of the parent entity for child record sets
    pub parent: Option<&'a RecordSet>,
}

/// Collects the outcome of a single rule run
///
/// Records are flagged by index into [`RecordSet::records`]; the caller marks
/// them errored once the rule has finished.
#[derive(Debug)]
pub struct RuleReport<'a> {
    messages: &'a mut EntityMessages,
    flagged: Vec<usize>,
    has_error: bool,
}

impl<'a> RuleReport<'a> {
    pub fn new(messages: &'a mut EntityMessages) -> Self {
        Self {
            messages,
            flagged: Vec::new(),
            has_error: false,
        }
    }

    pub fn add(&mut self, level: RuleLevel, group: &str, message: impl Into<String>) {
        if level == RuleLevel::Error {
            self.has_error = true;
        }
        self.messages.add_message(group, Message::new(message), level);
    }

    /// Mark the record at `index` errored when `level` is ERROR
    pub fn flag(&mut self, level: RuleLevel, index: usize) {
        if level == RuleLevel::Error {
            self.flagged.push(index);
        }
    }

    pub fn flagged(&self) -> &[usize] {
        &self.flagged
    }

    /// True when an ERROR level message was reported
    pub fn has_error(&self) -> bool {
        self.has_error
    }
}

/// Behavior shared by every rule variant
pub(crate) trait RuleCheck {
    fn level(&self) -> RuleLevel;

    fn network_flag(&mut self) -> &mut NetworkFlag;

    fn is_network_rule(&self) -> bool;

    fn valid_configuration(&self, messages: &mut Vec<String>, entity: &Entity, config: &Config)
        -> bool;

    /// Run against `record_set`, assuming a valid configuration
    fn check(&self, record_set: &RecordSet, ctx: &RuleContext<'_>, report: &mut RuleReport<'_>)
        -> bool;

    fn to_project_rule(&self, columns: &[String]) -> Option<Rule>;

    fn merge_rule(&mut self, _other: &Rule) -> bool {
        false
    }
}

/// Implements the flag accessors for a struct with `level` and `network_rule` fields
macro_rules! rule_basics {
    () => {
        fn level(&self) -> $crate::rules::RuleLevel {
            self.level
        }

        fn network_flag(&mut self) -> &mut $crate::rules::NetworkFlag {
            &mut self.network_rule
        }

        fn is_network_rule(&self) -> bool {
            self.network_rule.0
        }
    };
}
pub(crate) use rule_basics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Rule {
    RequiredValue(RequiredValue),
    UniqueValue(UniqueValue),
    CompositeUniqueValue(CompositeUniqueValue),
    ControlledVocabulary(ControlledVocabulary),
    MinMaxNumber(MinMaxNumber),
    NumericRange(NumericRange),
    RegExp(RegExp),
    RequireValueIfOtherColumn(RequireValueIfOtherColumn),
    RequiredValueInGroup(RequiredValueInGroup),
    ValidDataTypeFormat(ValidDataTypeFormat),
    #[serde(rename = "ValidForURI")]
    ValidForUri(ValidForUri),
    ValidParentIdentifiers(ValidParentIdentifiers),
    #[serde(rename = "ValidURL")]
    ValidUrl(ValidUrl),
}

macro_rules! dispatch {
    ($rule:expr, $r:ident => $body:expr) => {
        match $rule {
            Rule::RequiredValue($r) => $body,
            Rule::UniqueValue($r) => $body,
            Rule::CompositeUniqueValue($r) => $body,
            Rule::ControlledVocabulary($r) => $body,
            Rule::MinMaxNumber($r) => $body,
            Rule::NumericRange($r) => $body,
            Rule::RegExp($r) => $body,
            Rule::RequireValueIfOtherColumn($r) => $body,
            Rule::RequiredValueInGroup($r) => $body,
            Rule::ValidDataTypeFormat($r) => $body,
            Rule::ValidForUri($r) => $body,
            Rule::ValidParentIdentifiers($r) => $body,
            Rule::ValidUrl($r) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Rule {
                fn from(rule: $variant) -> Self {
                    Rule::$variant(rule)
                }
            }
        )*
    };
}

impl_from!(
    RequiredValue,
    UniqueValue,
    CompositeUniqueValue,
    ControlledVocabulary,
    MinMaxNumber,
    NumericRange,
    RegExp,
    RequireValueIfOtherColumn,
    RequiredValueInGroup,
    ValidDataTypeFormat,
    ValidForUri,
    ValidParentIdentifiers,
    ValidUrl,
);

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::RequiredValue(_) => "RequiredValue",
            Rule::UniqueValue(_) => "UniqueValue",
            Rule::CompositeUniqueValue(_) => "CompositeUniqueValue",
            Rule::ControlledVocabulary(_) => "ControlledVocabulary",
            Rule::MinMaxNumber(_) => "MinMaxNumber",
            Rule::NumericRange(_) => "NumericRange",
            Rule::RegExp(_) => "RegExp",
            Rule::RequireValueIfOtherColumn(_) => "RequireValueIfOtherColumn",
            Rule::RequiredValueInGroup(_) => "RequiredValueInGroup",
            Rule::ValidDataTypeFormat(_) => "ValidDataTypeFormat",
            Rule::ValidForUri(_) => "ValidForURI",
            Rule::ValidParentIdentifiers(_) => "ValidParentIdentifiers",
            Rule::ValidUrl(_) => "ValidURL",
        }
    }

    pub fn level(&self) -> RuleLevel {
        dispatch!(self, r => r.level())
    }

    pub fn is_network_rule(&self) -> bool {
        dispatch!(self, r => r.is_network_rule())
    }

    pub fn set_network_rule(&mut self, network_rule: bool) {
        dispatch!(self, r => r.network_flag().0 = network_rule)
    }

    /// Check the rule against `entity`, pushing a message per problem
    pub fn valid_configuration(
        &self,
        messages: &mut Vec<String>,
        entity: &Entity,
        config: &Config,
    ) -> bool {
        dispatch!(self, r => r.valid_configuration(messages, entity, config))
    }

    /// Run the rule, returning `false` when any record failed
    ///
    /// A misconfigured rule reports its problems in
    /// [`INVALID_RULE_CONFIGURATION_GROUP`] and fails without checking records.
    pub fn run(
        &self,
        record_set: &RecordSet,
        ctx: &RuleContext<'_>,
        report: &mut RuleReport<'_>,
    ) -> bool {
        let mut problems = Vec::new();
        if !self.valid_configuration(&mut problems, record_set.entity(), ctx.config) {
            for problem in problems {
                report.add(RuleLevel::Error, INVALID_RULE_CONFIGURATION_GROUP, problem);
            }
            return false;
        }
        dispatch!(self, r => r.check(record_set, ctx, report))
    }

    /// Try to fold `other` into this rule
    pub fn merge_rule(&mut self, other: &Rule) -> bool {
        if discriminant(self) != discriminant(other) {
            return false;
        }
        dispatch!(self, r => r.merge_rule(other))
    }

    /// Whether `other` is covered by this rule, possibly after merging
    pub fn contains(&self, other: &Rule) -> bool {
        match (self, other) {
            (Rule::RequiredValue(a), Rule::RequiredValue(b)) => a.contains(b),
            (Rule::ValidDataTypeFormat(_), Rule::ValidDataTypeFormat(_))
            | (Rule::ValidParentIdentifiers(_), Rule::ValidParentIdentifiers(_)) => true,
            _ => self == other,
        }
    }

    /// Narrow this rule to the columns a project uses
    ///
    /// Returns `None` when the rule does not apply to any of `columns`.
    pub fn to_project_rule(&self, columns: &[String]) -> Option<Rule> {
        dispatch!(self, r => r.to_project_rule(columns))
    }
}

/// Ordered set of rules without duplicates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct Rules(Vec<Rule>);

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, merging it into an existing rule of the same kind if possible
    pub fn add(&mut self, rule: Rule) {
        for existing in self
            .0
            .iter_mut()
            .filter(|r| discriminant(&**r) == discriminant(&rule))
        {
            if existing.merge_rule(&rule) {
                return;
            }
            if *existing == rule {
                let network = existing.is_network_rule() || rule.is_network_rule();
                existing.set_network_rule(network);
                return;
            }
        }
        self.0.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Rule> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Rules {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|r| other.0.contains(r))
    }
}

impl From<Vec<Rule>> for Rules {
    fn from(rules: Vec<Rule>) -> Self {
        let mut set = Rules::new();
        for rule in rules {
            set.add(rule);
        }
        set
    }
}

impl From<Rules> for Vec<Rule> {
    fn from(rules: Rules) -> Self {
        rules.0
    }
}

impl<'a> IntoIterator for &'a Rules {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

/// Shared configuration check for rules that target one column
pub(crate) fn valid_column(
    name: &str,
    column: &str,
    messages: &mut Vec<String>,
    entity: &Entity,
) -> bool {
    if column.trim().is_empty() {
        messages.push(format!(
            "Invalid {name} Rule configuration. Column must not be blank or null."
        ));
        return false;
    }
    entity_has_attribute(name, column, messages, entity)
}

pub(crate) fn entity_has_attribute(
    name: &str,
    column: &str,
    messages: &mut Vec<String>,
    entity: &Entity,
) -> bool {
    if entity.attribute_uri(column).is_some() {
        return true;
    }
    messages.push(format!(
        "Invalid {name} Rule configuration. Could not find Attribute for column: {column} in entity: {}",
        entity.concept_alias
    ));
    false
}

/// Shared configuration check for rules spanning several columns
pub(crate) fn valid_columns(
    name: &str,
    columns: &[String],
    messages: &mut Vec<String>,
    entity: &Entity,
) -> bool {
    if columns.is_empty() {
        messages.push(format!(
            "Invalid {name} Rule configuration. columns must not be empty."
        ));
        return false;
    }
    let mut valid = true;
    for column in columns {
        valid &= valid_column(name, column, messages, entity);
    }
    valid
}

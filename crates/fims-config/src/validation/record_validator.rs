use super::EntityMessages;
use crate::config::Config;
use crate::records::RecordSet;
use crate::rules::{RuleContext, RuleReport};
use tracing::debug;

/// Outcome of validating one record set
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValidation {
    /// False when any rule failed, at any level
    pub is_valid: bool,
    /// True when a failing rule reported an ERROR
    pub has_error: bool,
    pub messages: EntityMessages,
}

/// Runs every rule of a record set's entity
#[derive(Debug, Clone, Copy)]
pub struct RecordValidator<'a> {
    config: &'a Config,
}

impl<'a> RecordValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Validate `record_set`, marking records that failed an ERROR rule
    ///
    /// Records are marked as soon as their rule finishes, so later rules
    /// skip them. `parent` is the record set of the parent entity for the
    /// same expedition, if any.
    pub fn validate(&self, record_set: &mut RecordSet, parent: Option<&RecordSet>) -> RecordValidation {
        let mut messages = EntityMessages::new(
            record_set.concept_alias(),
            record_set.entity().worksheet.clone(),
        );
        let ctx = RuleContext {
            config: self.config,
            parent,
        };

        let mut is_valid = true;
        let mut has_error = false;
        let rules = record_set.entity().rules.clone();
        for rule in &rules {
            let mut report = RuleReport::new(&mut messages);
            if !rule.run(record_set, &ctx, &mut report) {
                is_valid = false;
                has_error |= report.has_error();
            }
            let flagged = report.flagged().to_vec();

            let records = record_set.records_mut();
            for i in flagged {
                if let Some(record) = records.get_mut(i) {
                    record.set_error();
                }
            }
        }

        debug!(
            entity = %record_set.concept_alias(),
            is_valid,
            has_error,
            "Validated record set"
        );
        RecordValidation {
            is_valid,
            has_error,
            messages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{Attribute, Entity};
    use crate::records::Record;
    use crate::rules::{RegExp, RequiredValue, RuleLevel};
    use pretty_assertions::assert_eq;

    fn record(id: &str, code: &str) -> Record {
        let mut r = Record::new(Some(1), "exp");
        r.set("urn:eventID", id);
        r.set("urn:code", code);
        r
    }

    fn record_set() -> RecordSet {
        let mut event = Entity::new("event", "urn:event")
            .with_unique_key("eventID")
            .with_worksheet("Events");
        event.add_attribute(Attribute::new("eventID", "urn:eventID"));
        event.add_attribute(Attribute::new("code", "urn:code"));
        event.add_rule(RequiredValue::new(vec!["eventID".into()], RuleLevel::Error).into());
        event.add_rule(RegExp::new("code", "^[A-Z]+$", false, RuleLevel::Warning).into());

        RecordSet::with_records(event, vec![record("1", "AB"), record("", "cd")], false)
    }

    #[test]
    fn test_errors_mark_records() {
        let config = Config::default();
        let mut set = record_set();
        let result = RecordValidator::new(&config).validate(&mut set, None);

        assert!(!result.is_valid);
        assert!(result.has_error);
        assert_eq!(result.messages.sheet_name.as_deref(), Some("Events"));
        assert_eq!(result.messages.errors.len(), 1);
        // the record missing its eventID is skipped by the pattern rule
        assert!(result.messages.warnings.is_empty());
        assert!(!set.records()[0].has_error());
        assert!(set.records()[1].has_error());
    }

    #[test]
    fn test_warnings_only() {
        let config = Config::default();
        let mut set = record_set();
        set.records_mut()[1].set("urn:eventID", "2");

        let result = RecordValidator::new(&config).validate(&mut set, None);
        assert!(!result.is_valid);
        assert!(!result.has_error);
        assert!(set.records().iter().all(|r| !r.has_error()));
    }
}

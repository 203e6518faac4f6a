//! Validation message containers

use crate::rules::RuleLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Messages sharing a group heading, such as `Missing column(s)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesGroup {
    pub name: String,
    pub messages: Vec<Message>,
}

impl MessagesGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
        }
    }
}

fn add_to_groups(groups: &mut Vec<MessagesGroup>, group: &str, message: Message) {
    match groups.iter_mut().find(|g| g.name == group) {
        Some(g) => g.messages.push(message),
        None => {
            let mut g = MessagesGroup::new(group);
            g.messages.push(message);
            groups.push(g);
        }
    }
}

/// Error and warning groups for one entity on one sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMessages {
    #[serde(rename = "entity")]
    pub concept_alias: String,

    #[serde(rename = "sheetName", default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,

    #[serde(default)]
    pub errors: Vec<MessagesGroup>,

    #[serde(default)]
    pub warnings: Vec<MessagesGroup>,
}

impl EntityMessages {
    pub fn new(concept_alias: impl Into<String>, sheet_name: Option<String>) -> Self {
        Self {
            concept_alias: concept_alias.into(),
            sheet_name,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, group: &str, message: Message) {
        add_to_groups(&mut self.errors, group, message);
    }

    pub fn add_warning(&mut self, group: &str, message: Message) {
        add_to_groups(&mut self.warnings, group, message);
    }

    pub fn add_message(&mut self, group: &str, message: Message, level: RuleLevel) {
        match level {
            RuleLevel::Error => self.add_error(group, message),
            RuleLevel::Warning => self.add_warning(group, message),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Append every group of `other` into this collection
    pub fn merge(&mut self, other: EntityMessages) {
        for group in other.errors {
            for msg in group.messages {
                self.add_error(&group.name, msg);
            }
        }
        for group in other.warnings {
            for msg in group.messages {
                self.add_warning(&group.name, msg);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_messages_are_grouped_by_name() {
        let mut messages = EntityMessages::new("event", Some("Events".into()));
        messages.add_message("Missing column(s)", Message::new("a"), RuleLevel::Error);
        messages.add_message("Missing column(s)", Message::new("b"), RuleLevel::Error);
        messages.add_message("Invalid URL", Message::new("c"), RuleLevel::Warning);

        assert_eq!(messages.errors.len(), 1);
        assert_eq!(messages.errors[0].messages.len(), 2);
        assert_eq!(messages.warnings[0].name, "Invalid URL");
    }

    #[test]
    fn test_serialized_keys() {
        let mut messages = EntityMessages::new("event", Some("Events".into()));
        messages.add_error("Missing column(s)", Message::new("\"eventID\" has a missing cell value"));

        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "entity": "event",
                "sheetName": "Events",
                "errors": [{
                    "name": "Missing column(s)",
                    "messages": [{"message": "\"eventID\" has a missing cell value"}]
                }],
                "warnings": []
            })
        );
    }

    #[test]
    fn test_merge_appends_into_existing_groups() {
        let mut a = EntityMessages::new("event", None);
        a.add_error("g", Message::new("1"));
        let mut b = EntityMessages::new("event", None);
        b.add_error("g", Message::new("2"));
        b.add_warning("w", Message::new("3"));

        a.merge(b);
        assert_eq!(a.errors[0].messages, vec![Message::new("1"), Message::new("2")]);
        assert!(a.has_warnings());
    }
}

use crate::config::Config;
use crate::rules::RuleLevel;
use indexmap::IndexSet;
use std::cmp::Ordering;

/// Orders the columns of a worksheet for templates and exports
///
/// ERROR-required columns come first, then WARNING-required columns, then the
/// remaining columns in config order. Columns the worksheet does not define
/// sort last, alphabetically.
#[derive(Debug, Clone)]
pub struct ColumnComparator {
    sorted: IndexSet<String>,
}

impl ColumnComparator {
    pub fn new(config: &Config, worksheet: &str) -> Self {
        let sheet_columns: Vec<String> = config
            .attributes_for_sheet(worksheet)
            .into_iter()
            .map(|a| a.column.clone())
            .collect();

        let required = |level| {
            let mut columns: Vec<String> = config.required_columns(worksheet, level).into_iter().collect();
            // Required columns missing from the sheet sort ahead of the rest.
            columns.sort_by_key(|c| sheet_columns.iter().position(|s| s == c).map_or(-1, |i| i as i64));
            columns
        };

        let mut sorted = IndexSet::new();
        sorted.extend(required(RuleLevel::Error));
        sorted.extend(required(RuleLevel::Warning));
        sorted.extend(sheet_columns.iter().cloned());
        Self { sorted }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match (self.sorted.get_index_of(a), self.sorted.get_index_of(b)) {
            (Some(i), Some(j)) => i.cmp(&j),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }

    pub fn sort(&self, columns: &mut [String]) {
        columns.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{Attribute, Entity};
    use crate::rules::RequiredValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_columns() {
        let mut event = Entity::new("event", "urn:event").with_worksheet("Samples");
        for c in ["locality", "eventID", "country", "notes"] {
            event.add_attribute(Attribute::new(c, format!("urn:{c}")));
        }
        event.add_rule(RequiredValue::new(vec!["eventID".into()], RuleLevel::Error).into());
        event.add_rule(
            RequiredValue::new(vec!["country".into(), "locality".into()], RuleLevel::Warning).into(),
        );
        let mut config = Config::default();
        config.add_entity(event);

        let comparator = ColumnComparator::new(&config, "Samples");
        let mut columns: Vec<String> = ["zeta", "notes", "alpha", "country", "locality", "eventID"]
            .into_iter()
            .map(String::from)
            .collect();
        comparator.sort(&mut columns);

        assert_eq!(
            columns,
            vec!["eventID", "locality", "country", "notes", "alpha", "zeta"]
        );
    }
}

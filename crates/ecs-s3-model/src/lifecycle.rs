//! In-memory lifecycle configuration document.
//!
//! A [`LifecycleDocument`] is an ordered list of rules. It is materialized from
//! the server copy, edited, written back and then dropped: nothing here caches
//! state between requests.
//!
//! Rule ids are not required to be unique. Lookup and removal act on the first
//! matching rule.

use serde::{Deserialize, Serialize};

use crate::types::{LifecycleRule, UpsertPolicy};

/// What [`LifecycleDocument::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// The rule was added at the end of the document.
    Appended,
    /// An existing rule with the same id was replaced in place.
    Replaced,
}

/// Ordered collection of lifecycle rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleDocument {
    rules: Vec<LifecycleRule>,
}

impl LifecycleDocument {
    /// An empty document, used when the bucket has no lifecycle configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from rules, keeping their order.
    #[must_use]
    pub fn from_rules(rules: Vec<LifecycleRule>) -> Self {
        Self { rules }
    }

    /// Rules in document order.
    #[must_use]
    pub fn rules(&self) -> &[LifecycleRule] {
        &self.rules
    }

    /// Take the rules out of the document.
    #[must_use]
    pub fn into_rules(self) -> Vec<LifecycleRule> {
        self.rules
    }

    /// Number of rules, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the document has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule ids in document order, duplicates included.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    /// The first rule with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LifecycleRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Insert a rule according to `policy`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecs_s3_model::{
    ///     Expiration, LifecycleDocument, LifecycleRule, UpsertOutcome, UpsertPolicy,
    /// };
    ///
    /// let mut doc = LifecycleDocument::new();
    /// let rule = LifecycleRule::new("r1", Expiration::Days(30));
    ///
    /// assert_eq!(doc.upsert(rule.clone(), UpsertPolicy::Replace), UpsertOutcome::Appended);
    /// assert_eq!(doc.upsert(rule.clone(), UpsertPolicy::Replace), UpsertOutcome::Replaced);
    /// assert_eq!(doc.len(), 1);
    ///
    /// doc.upsert(rule, UpsertPolicy::Append);
    /// assert_eq!(doc.rule_ids(), vec!["r1", "r1"]);
    /// ```
    pub fn upsert(&mut self, rule: LifecycleRule, policy: UpsertPolicy) -> UpsertOutcome {
        if policy == UpsertPolicy::Replace {
            if let Some(existing) = self.rules.iter_mut().find(|r| r.id == rule.id) {
                *existing = rule;
                return UpsertOutcome::Replaced;
            }
        }
        self.rules.push(rule);
        UpsertOutcome::Appended
    }

    /// Remove the first rule with the given id.
    ///
    /// Returns `false`, leaving the document untouched, when no rule matches.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.rules.iter().position(|r| r.id == id) {
            Some(index) => {
                self.rules.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Expiration;

    fn rule(id: &str, days: u32) -> LifecycleRule {
        LifecycleRule::new(id, Expiration::Days(days))
    }

    #[test]
    fn test_should_append_when_id_is_new() {
        let mut doc = LifecycleDocument::new();
        let outcome = doc.upsert(rule("r1", 30), UpsertPolicy::Replace);

        assert_eq!(outcome, UpsertOutcome::Appended);
        assert_eq!(doc.rule_ids(), vec!["r1"]);
    }

    #[test]
    fn test_should_replace_first_match_in_place() {
        let mut doc = LifecycleDocument::from_rules(vec![rule("a", 1), rule("b", 2), rule("c", 3)]);
        let outcome = doc.upsert(rule("b", 90), UpsertPolicy::Replace);

        assert_eq!(outcome, UpsertOutcome::Replaced);
        assert_eq!(doc.rule_ids(), vec!["a", "b", "c"]);
        assert_eq!(doc.get("b").unwrap().expiration, Some(Expiration::Days(90)));
    }

    #[test]
    fn test_should_accumulate_duplicates_with_append_policy() {
        let mut doc = LifecycleDocument::new();
        doc.upsert(rule("dup", 1), UpsertPolicy::Append);
        let outcome = doc.upsert(rule("dup", 2), UpsertPolicy::Append);

        assert_eq!(outcome, UpsertOutcome::Appended);
        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc.get("dup").unwrap().expiration,
            Some(Expiration::Days(1))
        );
    }

    #[test]
    fn test_should_remove_only_first_duplicate() {
        let mut doc = LifecycleDocument::from_rules(vec![rule("x", 1), rule("y", 2), rule("x", 3)]);

        assert!(doc.remove("x"));
        assert_eq!(doc.rule_ids(), vec!["y", "x"]);
        assert_eq!(doc.get("x").unwrap().expiration, Some(Expiration::Days(3)));
    }

    #[test]
    fn test_should_leave_document_unchanged_when_removing_unknown_id() {
        let mut doc = LifecycleDocument::from_rules(vec![rule("keep", 10)]);
        let before = doc.clone();

        assert!(!doc.remove("missing"));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_should_report_empty_document() {
        let doc = LifecycleDocument::new();
        assert!(doc.is_empty());
        assert!(doc.rule_ids().is_empty());
        assert!(doc.get("anything").is_none());
    }
}

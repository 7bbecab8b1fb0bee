//! Pre-flight filtering of property names
//!
//! A [`Guard`] decides, without any I/O, whether a property name may be
//! looked up at all. Names it rejects never reach the request builder or the
//! vault client.

use crate::config::{ConfigAccessor, ConfigAccessorExt};
use crate::error::ProviderResult;
use regex::Regex;
use std::collections::HashSet;

pub const ACCEPT_LIST: &str = "oci.secrets.guard.accept-list";
pub const DENY_LIST: &str = "oci.secrets.guard.deny-list";
pub const ACCEPT_PATTERN: &str = "oci.secrets.guard.accept-pattern";

/// Accept-list, deny-list and pattern filter over property names
///
/// Every configured part must pass. An unconfigured accept-list or pattern
/// accepts everything; an unconfigured deny-list denies nothing.
#[derive(Debug, Clone, Default)]
pub struct Guard {
    accept: Option<HashSet<String>>,
    deny: Option<HashSet<String>>,
    pattern: Option<Regex>,
}

impl Guard {
    /// A guard that permits every name
    pub fn new() -> Self {
        Self::default()
    }

    /// Only permit these exact names
    ///
    /// Repeated calls extend the list. An empty list permits nothing.
    pub fn accept_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept
            .get_or_insert_with(HashSet::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Never permit these exact names
    pub fn deny_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny
            .get_or_insert_with(HashSet::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Only permit names the regular expression matches in full
    pub fn accept_pattern(mut self, pattern: &str) -> ProviderResult<Self> {
        self.pattern = Some(Regex::new(&format!("^(?:{})$", pattern))?);
        Ok(self)
    }

    /// Whether `name` may be looked up
    pub fn permits(&self, name: &str) -> bool {
        let accepted = self.accept.as_ref().map_or(true, |list| list.contains(name));
        let denied = self.deny.as_ref().map_or(false, |list| list.contains(name));
        let matched = self.pattern.as_ref().map_or(true, |re| re.is_match(name));

        let permitted = accepted && !denied && matched;
        if !permitted {
            tracing::trace!(name, accepted, denied, matched, "Guard rejected property");
        }
        permitted
    }

    /// Whether no part is configured
    pub fn is_unrestricted(&self) -> bool {
        self.accept.is_none() && self.deny.is_none() && self.pattern.is_none()
    }

    /// Build a guard from the `oci.secrets.guard.*` settings
    ///
    /// Returns `None` when none of them is set.
    pub fn from_config(config: &dyn ConfigAccessor) -> ProviderResult<Option<Guard>> {
        let mut guard = Guard::new();

        if let Some(names) = config.get_list(ACCEPT_LIST) {
            guard = guard.accept_list(names);
        }
        if let Some(names) = config.get_list(DENY_LIST) {
            guard = guard.deny_list(names);
        }
        if let Some(pattern) = config.get_string(ACCEPT_PATTERN) {
            guard = guard.accept_pattern(&pattern)?;
        }

        Ok(if guard.is_unrestricted() { None } else { Some(guard) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigAccessor;
    use crate::error::ProviderError;
    use proptest::prelude::*;

    #[test]
    fn test_unrestricted_guard() {
        let guard = Guard::new();
        assert!(guard.is_unrestricted());
        assert!(guard.permits("anything"));
        assert!(guard.permits(""));
    }

    #[test]
    fn test_accept_list() {
        let guard = Guard::new().accept_list(["db.secret"]);
        assert!(guard.permits("db.secret"));
        assert!(!guard.permits("other"));

        let empty = Guard::new().accept_list(Vec::<String>::new());
        assert!(!empty.permits("db.secret"));
    }

    #[test]
    fn test_deny_list() {
        let guard = Guard::new().deny_list(["java.home", "user.dir"]);
        assert!(!guard.permits("java.home"));
        assert!(guard.permits("db.secret"));
    }

    #[test]
    fn test_pattern_must_match_fully() {
        let guard = Guard::new().accept_pattern("db\\..*").unwrap();
        assert!(guard.permits("db.secret"));
        assert!(!guard.permits("app.db.secret"));

        let alternation = Guard::new().accept_pattern("a|b").unwrap();
        assert!(alternation.permits("a"));
        assert!(!alternation.permits("ab"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = Guard::new().accept_pattern("(unclosed");
        assert!(matches!(result, Err(ProviderError::InvalidPattern(_))));
    }

    #[test]
    fn test_combined_parts_all_apply() {
        let guard = Guard::new()
            .accept_list(["db.secret", "db.password"])
            .deny_list(["db.password"])
            .accept_pattern("db\\.s.*")
            .unwrap();

        assert!(guard.permits("db.secret"));
        assert!(!guard.permits("db.password"));
        assert!(!guard.permits("db.sequence"));
    }

    #[test]
    fn test_from_config() {
        assert!(Guard::from_config(&MapConfigAccessor::new()).unwrap().is_none());

        let config = MapConfigAccessor::new()
            .with(ACCEPT_LIST, "db.secret, api.key")
            .with(DENY_LIST, "api.key");
        let guard = Guard::from_config(&config).unwrap().unwrap();
        assert!(guard.permits("db.secret"));
        assert!(!guard.permits("api.key"));
        assert!(!guard.permits("other"));

        let config = MapConfigAccessor::new().with(ACCEPT_PATTERN, "[");
        assert!(Guard::from_config(&config).is_err());
    }

    proptest! {
        #[test]
        fn prop_parts_combine_by_and(
            name in "[a-z]{1,3}(\\.[a-z]{1,3})?",
            accept in prop::collection::vec("[a-z]{1,3}(\\.[a-z]{1,3})?", 0..4),
            deny in prop::collection::vec("[a-z]{1,3}", 0..4),
        ) {
            let accept_only = Guard::new().accept_list(accept.clone());
            let deny_only = Guard::new().deny_list(deny.clone());
            let pattern_only = Guard::new().accept_pattern("[a-m].*").unwrap();
            let combined = Guard::new()
                .accept_list(accept)
                .deny_list(deny)
                .accept_pattern("[a-m].*")
                .unwrap();

            prop_assert_eq!(
                combined.permits(&name),
                accept_only.permits(&name) && deny_only.permits(&name) && pattern_only.permits(&name)
            );
        }
    }
}

use regex::Regex;

use crate::error::FireProxError;
use crate::resource::ProxyResource;

/// Owner pattern used to narrow a listing.
///
/// The pattern uses regex syntax and is anchored at the start of the owner
/// value, so `ali` matches `alice` but `ice` does not. Resources without an
/// owner never match.
#[derive(Debug, Clone)]
pub struct OwnerFilter {
    pattern: String,
    regex: Regex,
}

impl OwnerFilter {
    pub fn new(pattern: &str) -> Result<Self, FireProxError> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
            FireProxError::Config(format!("invalid owner filter '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, resource: &ProxyResource) -> bool {
        resource
            .owner()
            .is_some_and(|owner| self.regex.is_match(owner))
    }

    /// Keep only the resources whose owner matches.
    pub fn apply(&self, resources: Vec<ProxyResource>) -> Vec<ProxyResource> {
        resources.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ProxyStatus, ResourceTag};

    fn owned(id: &str, owner: &str) -> ProxyResource {
        ProxyResource::new(id, ProxyStatus::Running)
            .with_tags(vec![ResourceTag::new("owner", owner)])
    }

    #[test]
    fn exact_owner_matches() {
        let filter = OwnerFilter::new("alice").unwrap();
        assert!(filter.matches(&owned("a", "alice")));
        assert!(!filter.matches(&owned("b", "bob")));
    }

    #[test]
    fn pattern_is_anchored_at_start() {
        let filter = OwnerFilter::new("ali").unwrap();
        assert!(filter.matches(&owned("a", "alice")));

        let filter = OwnerFilter::new("ice").unwrap();
        assert!(!filter.matches(&owned("a", "alice")));
    }

    #[test]
    fn alternation_is_grouped() {
        let filter = OwnerFilter::new("bob|carol").unwrap();
        assert!(filter.matches(&owned("a", "carol")));
        assert!(!filter.matches(&owned("b", "xcarol")));
    }

    #[test]
    fn unowned_resources_never_match() {
        let filter = OwnerFilter::new(".*").unwrap();
        assert!(!filter.matches(&ProxyResource::new("a", ProxyStatus::Running)));
    }

    #[test]
    fn apply_filters_list() {
        let filter = OwnerFilter::new("alice").unwrap();
        let kept = filter.apply(vec![
            owned("a", "alice"),
            ProxyResource::new("b", ProxyStatus::Running),
            owned("c", "bob"),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = OwnerFilter::new("(unclosed").unwrap_err();
        assert!(matches!(err, FireProxError::Config(_)));
    }
}

//! IAM policies and the binding removal edit

use crate::error::UpdateError;
use crate::resource::MutationPolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Members that carry no `type:` prefix
const PUBLIC_MEMBERS: &[&str] = &["allUsers", "allAuthenticatedUsers"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// IAM policy attached to a resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
    /// Concurrency token; a write with a stale etag fails with 409
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Removes one member from one role
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveBinding {
    pub member: String,
    pub role: String,
}

impl RemoveBinding {
    pub fn new(member: &str, role: &str) -> Self {
        Self {
            member: member.to_string(),
            role: role.to_string(),
        }
    }
}

impl MutationPolicy<Policy> for RemoveBinding {
    fn is_empty(&self) -> bool {
        self.member.is_empty() && self.role.is_empty()
    }

    fn precheck(&self) -> Result<(), UpdateError> {
        if self.member.is_empty() {
            return Err(UpdateError::invalid_value("--member", "must not be empty"));
        }
        if !self.member.contains(':') && !PUBLIC_MEMBERS.contains(&self.member.as_str()) {
            return Err(UpdateError::invalid_value(
                "--member",
                format!(
                    "{} should be prefixed with a type, e.g. user:{}",
                    self.member, self.member
                ),
            ));
        }
        if self.role.is_empty() {
            return Err(UpdateError::invalid_value("--role", "must not be empty"));
        }
        Ok(())
    }

    /// Removes the member from every binding of the role. Conditional
    /// bindings can repeat a role, and each of them may grant the member.
    fn apply(&self, original: &Policy, replacement: &mut Policy) -> Result<(), UpdateError> {
        let granted = |b: &Binding| b.role == self.role && b.members.contains(&self.member);

        if !original.bindings.iter().any(granted) {
            return Err(UpdateError::BindingNotFound {
                member: self.member.clone(),
                role: self.role.clone(),
            });
        }

        replacement.bindings.retain_mut(|binding| {
            if !granted(&*binding) {
                return true;
            }
            binding.members.retain(|m| m != &self.member);
            !binding.members.is_empty()
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> Policy {
        serde_json::from_value(json!({
            "version": 1,
            "etag": "BwUjMhCsNvY=",
            "bindings": [
                {"role": "roles/editor", "members": ["user:a@example.com", "user:b@example.com"]},
                {"role": "roles/viewer", "members": ["user:a@example.com"]}
            ]
        }))
        .unwrap()
    }

    fn remove(original: &Policy, member: &str, role: &str) -> Result<Policy, UpdateError> {
        let edit = RemoveBinding::new(member, role);
        edit.precheck()?;
        let mut replacement = original.clone();
        edit.apply(original, &mut replacement)?;
        Ok(replacement)
    }

    #[test]
    fn test_remove_one_member_keeps_binding() {
        let updated = remove(&policy(), "user:b@example.com", "roles/editor").unwrap();
        assert_eq!(updated.bindings.len(), 2);
        assert_eq!(updated.bindings[0].members, vec!["user:a@example.com"]);
        assert_eq!(updated.etag.as_deref(), Some("BwUjMhCsNvY="));
    }

    #[test]
    fn test_last_member_drops_binding() {
        let updated = remove(&policy(), "user:a@example.com", "roles/viewer").unwrap();
        assert_eq!(updated.bindings.len(), 1);
        assert_eq!(updated.bindings[0].role, "roles/editor");
    }

    #[test]
    fn test_missing_pair_is_not_found() {
        let err = remove(&policy(), "user:b@example.com", "roles/viewer").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Policy binding with the specified member [user:b@example.com] and role [roles/viewer] not found."
        );
    }

    #[test]
    fn test_member_needs_type_prefix() {
        assert!(matches!(
            remove(&policy(), "a@example.com", "roles/viewer"),
            Err(UpdateError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_member_removed_from_every_binding_of_role() {
        let original: Policy = serde_json::from_value(json!({
            "etag": "BwX",
            "bindings": [
                {"role": "roles/editor", "members": ["user:a@example.com"]},
                {"role": "roles/viewer", "members": ["user:a@example.com"]},
                {
                    "role": "roles/editor",
                    "members": ["user:a@example.com", "user:b@example.com"],
                    "condition": {"title": "weekdays", "expression": "request.time.getDayOfWeek() < 5"}
                }
            ]
        }))
        .unwrap();

        let updated = remove(&original, "user:a@example.com", "roles/editor").unwrap();
        assert_eq!(updated.bindings.len(), 2);
        assert_eq!(updated.bindings[0].role, "roles/viewer");
        assert_eq!(updated.bindings[1].members, vec!["user:b@example.com"]);
        assert!(updated.bindings[1].extra.contains_key("condition"));
    }

    #[test]
    fn test_policy_serializes_without_empty_fields() {
        let empty = Policy::default();
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({}));
    }
}

//! Cache key generation using SHA-256 hashes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::client::CallArgs;

/// Which parts of a call make up its cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Organization and method name only. Calls to the same method with
    /// different arguments share one entry.
    #[default]
    MethodOnly,
    /// Organization, method name and the canonical form of the arguments.
    IncludeArgs,
}

impl KeyPolicy {
    /// Derive the key for one call under this policy.
    pub fn key_for(&self, organization: &str, method_name: &str, args: &CallArgs) -> String {
        match self {
            KeyPolicy::MethodOnly => cache_key(organization, method_name),
            KeyPolicy::IncludeArgs => cache_key_with_args(organization, method_name, args),
        }
    }
}

/// Generate a deterministic cache key from organization and method name.
///
/// Each part is length-prefixed before hashing so that no two distinct
/// pairs feed the same bytes to the hasher.
pub fn cache_key(organization: &str, method_name: &str) -> String {
    let mut hasher = Sha256::new();
    update_part(&mut hasher, organization);
    update_part(&mut hasher, method_name);

    // Return hex-encoded hash
    format!("{:x}", hasher.finalize())
}

/// Generate a cache key that also covers the call arguments.
///
/// With no arguments this is the same key as [`cache_key`].
pub fn cache_key_with_args(organization: &str, method_name: &str, args: &CallArgs) -> String {
    if args.is_empty() {
        return cache_key(organization, method_name);
    }

    let mut hasher = Sha256::new();
    update_part(&mut hasher, organization);
    update_part(&mut hasher, method_name);
    update_part(&mut hasher, &args.canonical());

    format!("{:x}", hasher.finalize())
}

/// Hex digest naming the on-disk blob of an arbitrary cache key
pub(crate) fn blob_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    update_part(&mut hasher, key);
    format!("{:x}", hasher.finalize())
}

fn update_part(hasher: &mut Sha256, part: &str) {
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let key1 = cache_key("mozilla", "listUsers");
        let key2 = cache_key("mozilla", "listUsers");

        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 64);
    }

    #[test]
    fn test_cache_key_different_methods() {
        let key1 = cache_key("mozilla", "listUsers");
        let key2 = cache_key("mozilla", "listApps");

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_orgs() {
        let key1 = cache_key("mozilla", "listUsers");
        let key2 = cache_key("mozilla-services", "listUsers");

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_no_boundary_collision() {
        // Shifting characters between the parts must change the key
        let key1 = cache_key("ab", "c");
        let key2 = cache_key("a", "bc");

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_method_only_ignores_args() {
        let a = CallArgs::new().arg("2024-01-01");
        let b = CallArgs::new().arg("2024-02-01");

        let policy = KeyPolicy::MethodOnly;
        assert_eq!(
            policy.key_for("mozilla", "listUsers", &a),
            policy.key_for("mozilla", "listUsers", &b)
        );
    }

    #[test]
    fn test_include_args_separates_args() {
        let a = CallArgs::new().arg("2024-01-01");
        let b = CallArgs::new().arg("2024-02-01");

        let policy = KeyPolicy::IncludeArgs;
        assert_ne!(
            policy.key_for("mozilla", "listUsers", &a),
            policy.key_for("mozilla", "listUsers", &b)
        );
    }

    #[test]
    fn test_include_args_without_args_matches_method_only() {
        let empty = CallArgs::new();
        assert_eq!(
            cache_key_with_args("mozilla", "listUsers", &empty),
            cache_key("mozilla", "listUsers")
        );
    }

    #[test]
    fn test_blob_digest_is_hex() {
        let digest = blob_digest("../../é");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, blob_digest("../../e"));
    }

    #[test]
    fn test_key_policy_yaml_names() {
        let policy: KeyPolicy = serde_yaml::from_str("include_args").unwrap();
        assert_eq!(policy, KeyPolicy::IncludeArgs);
    }
}

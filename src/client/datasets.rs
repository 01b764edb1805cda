//! Named Heroku data sets and the projections that build them

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Record;

/// Categories of data collected for a Heroku team.
///
/// Only used as the key of the mapping returned by a Heroku fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DataSetKind {
    /// role -> emails of members without two-factor authentication
    RoleUser = 1,
    /// app -> emails of affected collaborators
    AppUser = 2,
    /// team member records as returned by the API
    User = 3,
}

impl DataSetKind {
    /// Mapping key for this data set
    pub fn key(&self) -> &'static str {
        match self {
            DataSetKind::RoleUser => "role_user",
            DataSetKind::AppUser => "app_user",
            DataSetKind::User => "user",
        }
    }
}

impl std::fmt::Display for DataSetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Optional data sets to collect alongside the member list.
///
/// Both are off by default; app data needs one request per team app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSets {
    #[serde(default)]
    pub role_users: bool,
    #[serde(default)]
    pub app_users: bool,
}

/// Email of a member or collaborator record.
///
/// Team members carry `email` at the top level; collaborators only under
/// `user.email`.
pub fn record_email(record: &Value) -> Option<&str> {
    record
        .get("email")
        .and_then(Value::as_str)
        .or_else(|| record.get("user")?.get("email")?.as_str())
}

/// Whether a member record explicitly reports 2FA as disabled.
///
/// A record without the field is not counted.
pub fn is_missing_2fa(member: &Value) -> bool {
    member.get("two_factor_authentication").and_then(Value::as_bool) == Some(false)
}

/// Emails of all members without two-factor authentication
pub fn missing_2fa_emails(members: &[Value]) -> BTreeSet<String> {
    members
        .iter()
        .filter(|m| is_missing_2fa(m))
        .filter_map(record_email)
        .map(str::to_string)
        .collect()
}

/// Group members without 2FA by team role.
///
/// Emails within each role are sorted and unique.
pub fn role_users(members: &[Value]) -> Record {
    let mut by_role: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for member in members.iter().filter(|m| is_missing_2fa(m)) {
        let Some(email) = record_email(member) else {
            continue;
        };
        let role = member
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        by_role
            .entry(role.to_string())
            .or_default()
            .insert(email.to_string());
    }

    into_record(by_role)
}

/// Map each app to its collaborators found in `affected`.
///
/// Apps with no affected collaborator are left out.
pub fn app_users(apps: &[(String, Vec<Value>)], affected: &BTreeSet<String>) -> Record {
    let mut by_app: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (app, collaborators) in apps {
        let emails: BTreeSet<String> = collaborators
            .iter()
            .filter_map(record_email)
            .filter(|email| affected.contains(*email))
            .map(str::to_string)
            .collect();
        if !emails.is_empty() {
            by_app.entry(app.clone()).or_default().extend(emails);
        }
    }

    into_record(by_app)
}

fn into_record(groups: BTreeMap<String, BTreeSet<String>>) -> Record {
    groups
        .into_iter()
        .map(|(name, emails)| {
            let emails = emails.into_iter().map(Value::String).collect();
            (name, Value::Array(emails))
        })
        .collect()
}

//! Identifier types for directory accounts and group members.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to a directory user entry.
///
/// Keeps the DN exactly as the directory returned it, for use as a `member`
/// value, alongside an uppercased key. Equality, hashing and ordering use the
/// key only, so two references differing only in letter case are equal.
#[derive(Debug, Clone)]
pub struct AccountId {
    dn: String,
    key: String,
}

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Self {
        let dn = raw.into();
        let key = normalize(&dn);
        Self { dn, key }
    }

    /// The reference as returned by the directory.
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Uppercased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Uppercase one char at a time. A char whose uppercase form is more than one
/// char (`ß` -> `SS`) is kept as is, so the key has the same char count.
fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

impl PartialEq for AccountId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for AccountId {}

impl Hash for AccountId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dn)
    }
}

impl From<&str> for AccountId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Accounts found under the user OU, in directory response order.
pub type AccountSet = Vec<AccountId>;

/// Current members of the target group, in attribute value order.
pub type GroupMemberSet = Vec<AccountId>;

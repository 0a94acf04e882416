//! LDAP client wrapper for the Active Directory group sync.

use std::collections::HashSet;

use adsync_core::config::AdConnectionConfig;
use adsync_core::error::{AdSyncError, Result};
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, Mod, Scope, SearchEntry};
use tracing::{debug, error, info};

use crate::directory::GroupDirectory;
use crate::models::{AccountId, AccountSet, GroupMemberSet};

/// Filter for user objects directly under the user OU.
const USER_FILTER: &str = "(&(objectClass=user))";
/// Attribute identifying a user entry; also the form `member` values take.
const ACCOUNT_ATTR: &str = "distinguishedName";
/// Group membership attribute.
const MEMBER_ATTR: &str = "member";

/// LDAP client for Active Directory operations.
///
/// Holds no connection; every operation binds a fresh session and unbinds it
/// before returning, whether or not the operation succeeded.
pub struct AdClient {
    server: String,
    bind_name: String,
    bind_password: String,
    user_dn: String,
    group_base_dn: String,
    group_name: String,
    group_filter: String,
    group_dn: String,
}

impl AdClient {
    /// Create a new AD client from connection configuration.
    pub fn new(config: &AdConnectionConfig) -> Self {
        Self {
            server: config.server_url(),
            bind_name: config.bind_name(),
            bind_password: config.password.clone(),
            user_dn: config.userdn.clone(),
            group_base_dn: config.groupdn.clone(),
            group_name: config.group.clone(),
            group_filter: config.group_filter(),
            group_dn: config.group_entry_dn(),
        }
    }

    /// DN of the group new members are added to.
    pub fn group_dn(&self) -> &str {
        &self.group_dn
    }

    async fn connect(&self) -> Result<Ldap> {
        let (conn, mut ldap) = LdapConnAsync::new(&self.server)
            .await
            .map_err(|e| AdSyncError::Connection(format!("{}: {e}", self.server)))
            .inspect_err(|e| error!("{e}"))?;

        ldap3::drive!(conn);

        let bound = match ldap.simple_bind(&self.bind_name, &self.bind_password).await {
            Ok(res) => res
                .success()
                .map(|_| ())
                .map_err(|e| AdSyncError::Authentication(format!("bind rejected: {e}"))),
            Err(e) => Err(AdSyncError::Authentication(format!("bind failed: {e}"))),
        };

        if let Err(e) = bound {
            error!("{e}");
            ldap.unbind().await.ok();
            return Err(e);
        }

        debug!(server = %self.server, bind_name = %self.bind_name, "LDAP bind successful");
        Ok(ldap)
    }

    /// Test the LDAP connection by binding and unbinding.
    pub async fn test_connection(&self) -> Result<()> {
        let mut ldap = self.connect().await?;
        ldap.unbind()
            .await
            .map_err(|e| AdSyncError::Connection(format!("unbind failed: {e}")))
            .inspect_err(|e| error!("{e}"))?;
        info!("AD connection test successful");
        Ok(())
    }

    async fn search_accounts(&self, ldap: &mut Ldap) -> Result<Vec<SearchEntry>> {
        let (results, _) = ldap
            .search(&self.user_dn, Scope::OneLevel, USER_FILTER, vec![ACCOUNT_ATTR])
            .await
            .map_err(|e| AdSyncError::Query(format!("user search failed: {e}")))?
            .success()
            .map_err(|e| AdSyncError::Query(format!("user search rejected: {e}")))?;

        Ok(results.into_iter().map(SearchEntry::construct).collect())
    }

    async fn search_group(&self, ldap: &mut Ldap) -> Result<Vec<SearchEntry>> {
        let (results, _) = ldap
            .search(
                &self.group_base_dn,
                Scope::OneLevel,
                &self.group_filter,
                vec![MEMBER_ATTR],
            )
            .await
            .map_err(|e| AdSyncError::Query(format!("group search failed: {e}")))?
            .success()
            .map_err(|e| AdSyncError::Query(format!("group search rejected: {e}")))?;

        Ok(results.into_iter().map(SearchEntry::construct).collect())
    }

    async fn add_group_member(&self, ldap: &mut Ldap, member: &str) -> Result<()> {
        let mods = vec![Mod::Add(
            MEMBER_ATTR.to_string(),
            HashSet::from([member.to_string()]),
        )];
        ldap.modify(&self.group_dn, mods)
            .await
            .map_err(|e| AdSyncError::Modification(format!("{member}: {e}")))?
            .success()
            .map_err(|e| AdSyncError::Modification(format!("{member}: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl GroupDirectory for AdClient {
    async fn list_accounts(&self) -> Result<AccountSet> {
        let mut ldap = self.connect().await?;
        let searched = self.search_accounts(&mut ldap).await;
        ldap.unbind().await.ok();

        let accounts = searched
            .and_then(accounts_from_entries)
            .inspect_err(|e| error!("{e}"))?;
        info!("{} records retrieved", accounts.len());
        Ok(accounts)
    }

    async fn list_group_members(&self) -> Result<GroupMemberSet> {
        let mut ldap = self.connect().await?;
        let searched = self.search_group(&mut ldap).await;
        ldap.unbind().await.ok();

        let members = searched
            .and_then(|entries| members_from_entries(&self.group_name, entries))
            .inspect_err(|e| error!("{e}"))?;
        info!("{} users in group", members.len());
        Ok(members)
    }

    async fn add_member(&self, account: &AccountId) -> Result<()> {
        let mut ldap = self.connect().await?;
        let added = self.add_group_member(&mut ldap, account.dn()).await;
        ldap.unbind().await.ok();

        added.inspect_err(|e| error!("{e}"))?;
        info!("{} added to group", account);
        debug!(group = %self.group_dn, member = %account, "member added");
        Ok(())
    }
}

/// Collect account identifiers from a user search, preserving response order.
fn accounts_from_entries(entries: Vec<SearchEntry>) -> Result<AccountSet> {
    if entries.is_empty() {
        return Err(AdSyncError::EmptyResult(
            "user OU returned no user entries".into(),
        ));
    }

    Ok(entries
        .iter()
        .map(|entry| {
            let value = attr_values(entry, ACCOUNT_ATTR)
                .and_then(|v| v.first())
                .map(String::as_str)
                .unwrap_or(entry.dn.as_str());
            AccountId::new(value)
        })
        .collect())
}

/// Collect member identifiers from the group search. Exactly one group entry
/// must match; a group without a `member` attribute has no members.
fn members_from_entries(group: &str, entries: Vec<SearchEntry>) -> Result<GroupMemberSet> {
    let entry = match entries.as_slice() {
        [] => return Err(AdSyncError::GroupNotFound(group.to_string())),
        [entry] => entry,
        many => {
            return Err(AdSyncError::AmbiguousGroup {
                name: group.to_string(),
                count: many.len(),
            })
        }
    };

    // AD switches to ranged retrieval (`member;range=0-1499`) for large groups.
    let ranged = entry
        .attrs
        .keys()
        .any(|key| key.to_ascii_lowercase().starts_with("member;range="));
    if ranged {
        return Err(AdSyncError::Query(format!(
            "membership of {group} exceeds the server's value limit and was truncated"
        )));
    }

    Ok(attr_values(entry, MEMBER_ATTR)
        .map(|values| values.iter().map(AccountId::new).collect())
        .unwrap_or_default())
}

/// Look up an attribute by name, ignoring case.
fn attr_values<'a>(entry: &'a SearchEntry, attr: &str) -> Option<&'a Vec<String>> {
    entry
        .attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(attr))
        .map(|(_, values)| values)
}

//! One-way membership sync: every account under the user OU becomes a member
//! of the configured group. Existing members are never removed.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use adsync_core::error::Result;

use crate::directory::GroupDirectory;
use crate::models::AccountId;

/// Summary of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Accounts found under the user OU.
    pub accounts: usize,
    /// Group members before the run.
    pub members: usize,
    /// Accounts added to the group.
    pub added: usize,
}

/// Accounts not yet in the group, in account order.
pub fn missing_members<'a>(
    accounts: &'a [AccountId],
    members: &[AccountId],
) -> Vec<&'a AccountId> {
    let current: HashSet<&AccountId> = members.iter().collect();
    accounts
        .iter()
        .filter(|account| !current.contains(account))
        .collect()
}

/// Drives a sync run against a [`GroupDirectory`].
pub struct MembershipSync<D: GroupDirectory> {
    directory: Arc<D>,
}

impl<D: GroupDirectory> MembershipSync<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// List accounts, list group members, then add the missing accounts.
    pub async fn run(&self) -> Result<SyncSummary> {
        info!("Loading the list of users from Active Directory");
        let accounts = self.directory.list_accounts().await?;

        info!("Loading the list of users in group");
        let members = self.directory.list_group_members().await?;

        info!("Synchronizing group membership");
        self.synchronize(&accounts, &members).await
    }

    /// Add every account absent from `members`, one at a time. The first
    /// failed addition aborts the run; later accounts are not attempted.
    pub async fn synchronize(
        &self,
        accounts: &[AccountId],
        members: &[AccountId],
    ) -> Result<SyncSummary> {
        let missing = missing_members(accounts, members);

        let mut summary = SyncSummary {
            accounts: accounts.len(),
            members: members.len(),
            added: 0,
        };

        for account in missing {
            self.directory.add_member(account).await?;
            summary.added += 1;
        }

        info!(
            accounts = summary.accounts,
            members = summary.members,
            added = summary.added,
            "group membership synchronized"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsync_core::error::AdSyncError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::models::{AccountSet, GroupMemberSet};

    // -- Mock directory --

    #[derive(Default)]
    struct MockDirectory {
        accounts: Vec<AccountId>,
        members: Vec<AccountId>,
        empty_search: bool,
        fail_on: Option<AccountId>,
        added: Mutex<Vec<AccountId>>,
    }

    impl MockDirectory {
        fn new(accounts: &[&str], members: &[&str]) -> Self {
            Self {
                accounts: ids(accounts),
                members: ids(members),
                ..Self::default()
            }
        }

        fn added(&self) -> Vec<AccountId> {
            self.added.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GroupDirectory for MockDirectory {
        async fn list_accounts(&self) -> Result<AccountSet> {
            if self.empty_search || self.accounts.is_empty() {
                return Err(AdSyncError::EmptyResult("no user entries".into()));
            }
            Ok(self.accounts.clone())
        }

        async fn list_group_members(&self) -> Result<GroupMemberSet> {
            Ok(self.members.clone())
        }

        async fn add_member(&self, account: &AccountId) -> Result<()> {
            if self.fail_on.as_ref() == Some(account) {
                return Err(AdSyncError::Modification(format!("{account}: denied")));
            }
            self.added.lock().unwrap().push(account.clone());
            Ok(())
        }
    }

    fn ids(raw: &[&str]) -> Vec<AccountId> {
        raw.iter().map(|s| AccountId::new(*s)).collect()
    }

    // -- missing_members --

    #[test]
    fn missing_is_set_difference_in_account_order() {
        let accounts = ids(&["CARL", "ALICE", "BOB", "DAVE"]);
        let members = ids(&["DAVE", "ALICE"]);
        let missing = missing_members(&accounts, &members);
        assert_eq!(missing, vec![&accounts[0], &accounts[2]]);
    }

    #[test]
    fn missing_never_includes_members() {
        let accounts = ids(&["ALICE", "BOB", "CARL"]);
        let members = ids(&["BOB", "ZED"]);
        let missing = missing_members(&accounts, &members);
        assert!(missing.iter().all(|a| !members.contains(*a)));
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn missing_ignores_letter_case() {
        let accounts = ids(&["cn=alice,ou=staff"]);
        let members = ids(&["CN=Alice,OU=Staff"]);
        assert!(missing_members(&accounts, &members).is_empty());
    }

    #[test]
    fn missing_with_empty_group_is_every_account() {
        let accounts = ids(&["ALICE", "BOB"]);
        let missing = missing_members(&accounts, &[]);
        assert_eq!(missing.len(), 2);
    }

    // -- synchronize / run --

    #[tokio::test]
    async fn adds_missing_accounts_in_order() {
        let dir = Arc::new(MockDirectory::new(&["ALICE", "BOB", "CARL"], &["BOB"]));
        let sync = MembershipSync::new(dir.clone());

        let summary = sync.run().await.unwrap();

        assert_eq!(dir.added(), ids(&["ALICE", "CARL"]));
        assert_eq!(
            summary,
            SyncSummary {
                accounts: 3,
                members: 1,
                added: 2,
            }
        );
    }

    #[tokio::test]
    async fn nothing_added_when_already_member() {
        let dir = Arc::new(MockDirectory::new(&["ALICE"], &["ALICE"]));
        let summary = MembershipSync::new(dir.clone()).run().await.unwrap();
        assert!(dir.added().is_empty());
        assert_eq!(summary.added, 0);
    }

    #[tokio::test]
    async fn account_listing_error_stops_run_before_any_addition() {
        let dir = Arc::new(MockDirectory {
            empty_search: true,
            ..MockDirectory::new(&[], &["BOB"])
        });
        let result = MembershipSync::new(dir.clone()).run().await;
        assert!(matches!(result, Err(AdSyncError::EmptyResult(_))));
        assert!(dir.added().is_empty());
    }

    #[tokio::test]
    async fn empty_group_adds_every_account() {
        let dir = Arc::new(MockDirectory::new(&["ALICE", "BOB", "CARL"], &[]));
        let summary = MembershipSync::new(dir.clone()).run().await.unwrap();
        assert_eq!(dir.added(), ids(&["ALICE", "BOB", "CARL"]));
        assert_eq!(summary.members, 0);
        assert_eq!(summary.added, 3);
    }

    #[tokio::test]
    async fn first_failure_aborts_remaining_additions() {
        let dir = Arc::new(MockDirectory {
            fail_on: Some(AccountId::new("BOB")),
            ..MockDirectory::new(&["ALICE", "BOB", "CARL"], &[])
        });
        let result = MembershipSync::new(dir.clone()).run().await;
        assert!(matches!(result, Err(AdSyncError::Modification(_))));
        assert_eq!(dir.added(), ids(&["ALICE"]));
    }

    #[tokio::test]
    async fn case_differences_do_not_trigger_additions() {
        let dir = Arc::new(MockDirectory::new(
            &["cn=alice,ou=staff", "cn=bob,ou=staff"],
            &["CN=ALICE,OU=STAFF"],
        ));
        MembershipSync::new(dir.clone()).run().await.unwrap();
        assert_eq!(dir.added(), ids(&["CN=BOB,OU=STAFF"]));
    }

    #[tokio::test]
    async fn second_pass_is_a_no_op() {
        let accounts = ids(&["ALICE", "BOB", "CARL"]);
        let members = ids(&["BOB"]);

        let dir = Arc::new(MockDirectory::default());
        let sync = MembershipSync::new(dir.clone());
        sync.synchronize(&accounts, &members).await.unwrap();

        let mut members_after = members.clone();
        members_after.extend(dir.added());

        let second = Arc::new(MockDirectory::default());
        let summary = MembershipSync::new(second.clone())
            .synchronize(&accounts, &members_after)
            .await
            .unwrap();
        assert_eq!(summary.added, 0);
        assert!(second.added().is_empty());
    }
}

//! Directory operations the membership sync depends on.

use adsync_core::error::Result;
use async_trait::async_trait;

use crate::models::{AccountId, AccountSet, GroupMemberSet};

/// The three directory round-trips a sync run performs.
///
/// Implementations open and close their own session per call.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// All user accounts directly under the configured user OU.
    /// An empty result is an error.
    async fn list_accounts(&self) -> Result<AccountSet>;

    /// Current members of the configured group. A group without a
    /// `member` attribute yields an empty set.
    async fn list_group_members(&self) -> Result<GroupMemberSet>;

    /// Add one account to the configured group.
    async fn add_member(&self, account: &AccountId) -> Result<()>;
}

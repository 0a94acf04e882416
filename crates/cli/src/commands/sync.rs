use std::sync::Arc;

use adsync_ad::client::AdClient;
use adsync_ad::sync::MembershipSync;
use adsync_core::config::AdSyncConfig;
use tracing::info;

/// Run the `sync` command: add every account under the user OU to the group.
pub async fn run(config: &AdSyncConfig) -> anyhow::Result<()> {
    let ad = &config.activedirectory;
    info!(
        server = %ad.server_url(),
        userdn = %ad.userdn,
        group = %ad.group_entry_dn(),
        "Starting AD group sync"
    );

    let client = Arc::new(AdClient::new(ad));
    let summary = MembershipSync::new(client).run().await?;

    println!("AD group sync completed!");
    println!("  Accounts in OU:    {}", summary.accounts);
    println!("  Members before:    {}", summary.members);
    println!("  Members added:     {}", summary.added);

    Ok(())
}

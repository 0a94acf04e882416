use adsync_ad::client::AdClient;
use adsync_core::config::AdSyncConfig;

/// Run the `test-connection` command: bind with the configured credential
/// and unbind again.
pub async fn run(config: &AdSyncConfig) -> anyhow::Result<()> {
    let ad = &config.activedirectory;
    println!(
        "Testing LDAP connection to {} as {}...",
        ad.server_url(),
        ad.bind_name()
    );

    let client = AdClient::new(ad);
    match client.test_connection().await {
        Ok(()) => {
            println!("LDAP connection successful!");
            Ok(())
        }
        Err(e) => {
            println!("LDAP connection failed: {e}");
            Err(e.into())
        }
    }
}

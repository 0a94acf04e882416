//! Configuration for the AD group sync, deserialized from TOML or JSON.

use crate::error::{AdSyncError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Standard (plaintext) LDAP port.
pub const LDAP_PORT: u16 = 389;

/// Top-level configuration, loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSyncConfig {
    #[serde(alias = "ActiveDirectory")]
    pub activedirectory: AdConnectionConfig,
    #[serde(default, alias = "Logging")]
    pub logging: LoggingConfig,
}

/// Directory connection, bind credential and search locations.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdConnectionConfig {
    #[serde(default = "default_host", alias = "Host")]
    pub host: String,
    /// NetBIOS domain used to build the `DOMAIN\user` bind name.
    #[serde(default, alias = "Domain")]
    pub domain: String,
    #[serde(default, alias = "Username")]
    pub username: String,
    #[serde(default, alias = "Password")]
    pub password: String,
    /// OU whose direct user children are the source accounts.
    #[serde(default, alias = "UserDN")]
    pub userdn: String,
    /// Container holding the target group.
    #[serde(default, alias = "GroupDN")]
    pub groupdn: String,
    /// Common name of the target group.
    #[serde(default, alias = "Group")]
    pub group: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for AdConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            domain: String::new(),
            username: String::new(),
            password: String::new(),
            userdn: String::new(),
            groupdn: String::new(),
            group: String::new(),
        }
    }
}

impl fmt::Debug for AdConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdConnectionConfig")
            .field("host", &self.host)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("userdn", &self.userdn)
            .field("groupdn", &self.groupdn)
            .field("group", &self.group)
            .finish()
    }
}

impl AdConnectionConfig {
    /// LDAP URL of the directory server, always on the plaintext port.
    pub fn server_url(&self) -> String {
        format!("ldap://{}:{}", self.host, LDAP_PORT)
    }

    /// Down-level logon name used for the simple bind.
    pub fn bind_name(&self) -> String {
        format!("{}\\{}", self.domain, self.username)
    }

    /// DN of the group entry that receives new members. The group name is
    /// escaped as an RDN value.
    pub fn group_entry_dn(&self) -> String {
        format!(
            "CN={},{}",
            ldap3::dn_escape(self.group.as_str()),
            self.groupdn
        )
    }

    /// Filter matching the configured group by common name.
    pub fn group_filter(&self) -> String {
        format!(
            "(&(objectClass=group)(cn={}))",
            ldap3::ldap_escape(self.group.as_str())
        )
    }
}

/// Optional log file output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, alias = "Enabled")]
    pub enabled: bool,
    /// Directory the daily log file is written to.
    #[serde(default = "default_log_location", alias = "Location")]
    pub location: PathBuf,
}

fn default_log_location() -> PathBuf {
    PathBuf::from(".")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            location: default_log_location(),
        }
    }
}

impl AdSyncConfig {
    /// Load configuration from a file. Files ending in `.json` are parsed as
    /// JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| AdSyncError::Config(format!("config file is corrupt: {e}")))?
        } else {
            toml::from_str(&content)
                .map_err(|e| AdSyncError::Config(format!("config file is corrupt: {e}")))?
        };
        Ok(config)
    }

    /// Validate the configuration, returning an error naming the first empty
    /// required key.
    pub fn validate(&self) -> Result<()> {
        let ad = &self.activedirectory;
        let required = [
            ("activedirectory.host", &ad.host),
            ("activedirectory.domain", &ad.domain),
            ("activedirectory.username", &ad.username),
            ("activedirectory.password", &ad.password),
            ("activedirectory.userdn", &ad.userdn),
            ("activedirectory.groupdn", &ad.groupdn),
            ("activedirectory.group", &ad.group),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(AdSyncError::Config(format!("{key} must not be empty")));
            }
        }

        if self.logging.enabled && self.logging.location.as_os_str().is_empty() {
            return Err(AdSyncError::Config(
                "logging.location must not be empty when logging is enabled".into(),
            ));
        }

        Ok(())
    }
}

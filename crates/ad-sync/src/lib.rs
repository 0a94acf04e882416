//! AD Sync -- keeps an Active Directory security group's membership in step
//! with the user accounts of an organizational unit, over LDAP.
//!
//! The sync is additive only: accounts missing from the group are added,
//! existing members are left alone.

pub mod client;
pub mod directory;
pub mod models;
pub mod sync;

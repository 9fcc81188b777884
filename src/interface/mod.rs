//! Adapters for the collaborators around the session core

pub mod entitlements;
pub mod notifier;

pub use entitlements::{AllowAll, HttpEntitlementChecker, InMemoryEntitlements};
pub use notifier::{ChannelNotifier, LogNotifier, NullNotifier};

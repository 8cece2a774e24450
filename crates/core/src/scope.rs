//! Scope identities and the host environment that resolves them.

use std::fmt;

/// The bucket of options a store addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The local, single-tenant bucket.
    Site,
    /// A network-wide bucket in a multi-tenant deployment.
    Network(u64),
}

impl Scope {
    /// Stable string form used as a partition key by persistent backends.
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Site => f.write_str("site"),
            Scope::Network(id) => write!(f, "network:{id}"),
        }
    }
}

/// What the deployment environment knows about tenancy.
pub trait Host: Send + Sync {
    /// Whether this is a multi-tenant (networked) installation.
    fn is_networked(&self) -> bool;

    /// Network the current process is serving.
    fn current_network_id(&self) -> u64;
}

/// A `Host` answering from fixed values, typically built from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHost {
    pub networked: bool,
    pub current_network_id: u64,
}

impl StaticHost {
    /// Single-tenant host.
    pub fn single() -> Self {
        Self { networked: false, current_network_id: 1 }
    }

    /// Networked host currently serving `network_id`.
    pub fn networked(network_id: u64) -> Self {
        Self { networked: true, current_network_id: network_id }
    }
}

impl Host for StaticHost {
    fn is_networked(&self) -> bool {
        self.networked
    }

    fn current_network_id(&self) -> u64 {
        self.current_network_id
    }
}

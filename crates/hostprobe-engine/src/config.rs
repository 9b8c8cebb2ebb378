//! Engine configuration (hostprobe.toml)
//!
//! Maps every host role to the ordered list of class names it may carry
//! across host releases. Roles left out of the file keep their defaults.
//!
//! ```toml
//! [types]
//! server_wrapper = [
//!     "org.bukkit.craftbukkit.CraftServer",
//!     "org.bukkit.craftbukkit.v1_19_R1.CraftServer",
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::reflect::HostRole;

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProbeConfig {
    /// Candidate class names per host role
    #[serde(default)]
    pub types: TypeCandidates,
}

/// Candidate class names per host role, tried in order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TypeCandidates {
    /// Acceptance handler installed on listening channels
    #[serde(default = "default_acceptor")]
    pub acceptor: Vec<String>,
    /// Connection manager owned by the internal server
    #[serde(default = "default_connection_manager")]
    pub connection_manager: Vec<String>,
    /// Internal server object
    #[serde(default = "default_internal_server")]
    pub internal_server: Vec<String>,
    /// Public server wrapper handed to plugins
    #[serde(default = "default_server_wrapper")]
    pub server_wrapper: Vec<String>,
    /// Channel base type declaring the remote address
    #[serde(default = "default_abstract_channel")]
    pub abstract_channel: Vec<String>,
    /// Asynchronous bind result
    #[serde(default = "default_bind_future")]
    pub bind_future: Vec<String>,
    /// Listening channel
    #[serde(default = "default_server_channel")]
    pub server_channel: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_acceptor() -> Vec<String> {
    names(&["io.netty.bootstrap.ServerBootstrap$ServerBootstrapAcceptor"])
}

fn default_connection_manager() -> Vec<String> {
    names(&["net.minecraft.server.network.ServerConnection"])
}

fn default_internal_server() -> Vec<String> {
    names(&["net.minecraft.server.MinecraftServer"])
}

fn default_server_wrapper() -> Vec<String> {
    names(&[
        "org.bukkit.craftbukkit.CraftServer",
        "org.bukkit.craftbukkit.v1_19_R1.CraftServer",
    ])
}

fn default_abstract_channel() -> Vec<String> {
    names(&["io.netty.channel.AbstractChannel"])
}

fn default_bind_future() -> Vec<String> {
    names(&["io.netty.channel.ChannelFuture"])
}

fn default_server_channel() -> Vec<String> {
    names(&["io.netty.channel.ServerChannel"])
}

impl Default for TypeCandidates {
    fn default() -> Self {
        Self {
            acceptor: default_acceptor(),
            connection_manager: default_connection_manager(),
            internal_server: default_internal_server(),
            server_wrapper: default_server_wrapper(),
            abstract_channel: default_abstract_channel(),
            bind_future: default_bind_future(),
            server_channel: default_server_channel(),
        }
    }
}

impl TypeCandidates {
    /// Candidate list for a role
    pub fn for_role(&self, role: HostRole) -> &[String] {
        match role {
            HostRole::Acceptor => &self.acceptor,
            HostRole::ConnectionManager => &self.connection_manager,
            HostRole::InternalServer => &self.internal_server,
            HostRole::ServerWrapper => &self.server_wrapper,
            HostRole::AbstractChannel => &self.abstract_channel,
            HostRole::BindFuture => &self.bind_future,
            HostRole::ServerChannel => &self.server_channel,
        }
    }
}

impl ProbeConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ProbeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Every role needs at least one non-blank candidate
    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in HostRole::ALL {
            let candidates = self.types.for_role(role);
            if candidates.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "types.{} has no candidates",
                    role.key()
                )));
            }
            if candidates.iter().any(|name| name.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "types.{} contains a blank class name",
                    role.key()
                )));
            }
        }
        Ok(())
    }
}

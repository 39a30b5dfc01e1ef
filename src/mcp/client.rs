//! [`NamedClient`] bindings for MCP client types.
//!
//! A provider is keyed on the server name it reports during the MCP handshake.

use rmcp::{
    model::{Implementation, InitializeResult},
    service::{RoleClient, RunningService, Service},
};

use super::registry::NamedClient;

impl NamedClient for Implementation {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedClient for InitializeResult {
    fn name(&self) -> &str {
        &self.server_info.name
    }
}

/// Running client sessions are named after the server they connected to.
///
/// A session that has not finished the handshake reports an empty name.
impl<S> NamedClient for RunningService<RoleClient, S>
where
    S: Service<RoleClient>,
{
    fn name(&self) -> &str {
        self.peer()
            .peer_info()
            .map(|info| info.server_info.name.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{ToolRegistry, dedupe_clients};
    use rmcp::model::ServerInfo;

    fn server(name: &str, version: &str) -> ServerInfo {
        let mut implementation = Implementation::from_build_env();
        implementation.name = name.to_string();
        implementation.version = version.to_string();
        ServerInfo {
            server_info: implementation,
            ..ServerInfo::default()
        }
    }

    #[test]
    fn server_infos_dedupe_by_reported_name() {
        let infos = vec![
            server("mcp-server-csdn", "1.0.0"),
            server("filesystem", "0.6.2"),
            server("mcp-server-csdn", "1.1.0"),
        ];
        let deduped = dedupe_clients(infos);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].server_info.version, "1.0.0");
        assert_eq!(deduped[1].name(), "filesystem");
    }

    #[test]
    fn registry_resolves_implementations() {
        let registry = ToolRegistry::new(vec![
            server("filesystem", "1").server_info,
            server("filesystem", "2").server_info,
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("filesystem").map(|info| info.version.as_str()),
            Some("1")
        );
    }
}

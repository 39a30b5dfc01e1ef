//! Model Context Protocol (MCP) tool-provider registry.
//!
//! Client discovery can report the same server more than once (for example, when a server is
//! configured both globally and per project). The registry keeps one provider per reported
//! name, the first one discovered, so tool dispatch by name stays unambiguous.

mod client;
mod registry;

pub use registry::{NamedClient, ToolRegistry, dedupe_clients};

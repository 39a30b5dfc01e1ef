use std::collections::{HashMap, HashSet};

/// A tool provider identified by a unique name.
pub trait NamedClient {
    /// Lookup key used by the orchestration layer to dispatch calls.
    fn name(&self) -> &str;
}

impl NamedClient for String {
    fn name(&self) -> &str {
        self
    }
}

impl NamedClient for &str {
    fn name(&self) -> &str {
        self
    }
}

impl<T: NamedClient + ?Sized> NamedClient for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Keep the first client seen for each name, preserving input order.
///
/// Later clients with an already-seen name are dropped and logged. An input without duplicates
/// comes back unchanged.
pub fn dedupe_clients<C: NamedClient>(clients: Vec<C>) -> Vec<C> {
    let mut seen = HashSet::with_capacity(clients.len());
    clients
        .into_iter()
        .enumerate()
        .filter_map(|(position, client)| {
            if seen.insert(client.name().to_string()) {
                Some(client)
            } else {
                tracing::warn!(
                    name = client.name(),
                    position,
                    "Dropping duplicate tool provider"
                );
                None
            }
        })
        .collect()
}

/// Registry mapping provider names to deduplicated clients.
///
/// Built once while the process starts. [`ToolRegistry::rebuild`] takes `&mut self`, so
/// concurrent rebuilds need external synchronization.
pub struct ToolRegistry<C> {
    clients: Vec<C>,
    by_name: HashMap<String, usize>,
}

impl<C: NamedClient> ToolRegistry<C> {
    /// Deduplicate `clients` and index the survivors by name.
    pub fn new(clients: Vec<C>) -> Self {
        let discovered = clients.len();
        let clients = dedupe_clients(clients);
        let by_name = clients
            .iter()
            .enumerate()
            .map(|(idx, client)| (client.name().to_string(), idx))
            .collect();
        tracing::info!(
            discovered,
            registered = clients.len(),
            "Tool registry ready"
        );
        Self { clients, by_name }
    }

    /// Replace the registered clients with a freshly discovered list.
    pub fn rebuild(&mut self, clients: Vec<C>) {
        *self = Self::new(clients);
    }

    /// Look up a client by name.
    pub fn get(&self, name: &str) -> Option<&C> {
        self.by_name.get(name).map(|&idx| &self.clients[idx])
    }

    /// Registered names in discovery order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.iter().map(NamedClient::name)
    }

    /// Registered clients in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.clients.iter()
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Hand the deduplicated clients to the tool-invocation layer.
    pub fn into_clients(self) -> Vec<C> {
        self.clients
    }
}

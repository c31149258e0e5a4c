use serde::{Deserialize, Serialize};

use nomen_types::{Address, HierarchicalName, NameError, NodeId};

/// The parent name this service provisions under, with the fixed contracts
/// it talks to. Operator configuration; validated once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentZone {
    /// Pre-registered parent suffix, e.g. `kantina.base.eth`.
    pub parent_name: String,
    /// Registry contract holding ownership records.
    pub registry: Address,
    /// Resolver contract holding resolved addresses.
    pub resolver: Address,
    /// Smart-wallet factory used for predicted deployment addresses.
    pub wallet_factory: Address,
    /// TTL passed when binding a subnode record.
    #[serde(default)]
    pub subnode_ttl: u64,
}

impl ParentZone {
    /// Canonical subname for an untrusted leaf label.
    pub fn name(&self, label: &str) -> Result<HierarchicalName, NameError> {
        HierarchicalName::new(label, &self.parent_name)
    }

    /// Node identifier of the parent name itself.
    pub fn parent_node(&self) -> Result<NodeId, NameError> {
        nomen_types::namehash(&self.parent_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ParentZone {
        ParentZone {
            parent_name: "kantina.base.eth".into(),
            registry: Address([0x01; 20]),
            resolver: Address([0x02; 20]),
            wallet_factory: Address([0x03; 20]),
            subnode_ttl: 0,
        }
    }

    #[test]
    fn builds_canonical_subnames() {
        let name = zone().name("Alice").unwrap();
        assert_eq!(name.full(), "alice.kantina.base.eth");
    }

    #[test]
    fn parent_node_matches_namehash() {
        assert_eq!(
            zone().parent_node().unwrap(),
            nomen_types::namehash("kantina.base.eth").unwrap()
        );
    }
}

use lumino_types::{AccountId, LuminoError, NodeId, PoolId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry record for a compute-provider node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub owner: AccountId,
    pub pool: PoolId,
    pub compute_rating: u64,
    pub active: bool,
}

/// Node ownership and pool membership
pub trait NodeRegistry: Send {
    fn node(&self, node: NodeId) -> Option<NodeInfo>;

    fn owner_of(&self, node: NodeId) -> Option<AccountId> {
        self.node(node).map(|info| info.owner)
    }

    fn is_active(&self, node: NodeId) -> bool {
        self.node(node).map(|info| info.active).unwrap_or(false)
    }

    /// Active nodes serving a pool, in registration order
    fn nodes_in_pool(&self, pool: PoolId) -> Vec<NodeId>;

    /// Nodes owned by an account
    fn nodes_of(&self, owner: &AccountId) -> Vec<NodeId>;

    fn register_node(&mut self, owner: &AccountId, pool: PoolId, compute_rating: u64) -> Result<NodeId>;

    fn unregister_node(&mut self, node: NodeId) -> Result<()>;

    /// Fails unless `caller` owns `node`
    fn require_owner(&self, node: NodeId, caller: &AccountId) -> Result<()> {
        let owner = self.owner_of(node).ok_or(LuminoError::NodeNotFound(node))?;
        if &owner != caller {
            return Err(LuminoError::NotAuthorized(
                caller.clone(),
                format!("does not own {}", node),
            ));
        }
        Ok(())
    }
}

/// In-memory node registry. Node ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    nodes: BTreeMap<NodeId, NodeInfo>,
    next_id: u64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        MemoryRegistry {
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeRegistry for MemoryRegistry {
    fn node(&self, node: NodeId) -> Option<NodeInfo> {
        self.nodes.get(&node).cloned()
    }

    fn nodes_in_pool(&self, pool: PoolId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|info| info.pool == pool && info.active)
            .map(|info| info.id)
            .collect()
    }

    fn nodes_of(&self, owner: &AccountId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|info| &info.owner == owner)
            .map(|info| info.id)
            .collect()
    }

    fn register_node(&mut self, owner: &AccountId, pool: PoolId, compute_rating: u64) -> Result<NodeId> {
        let id = NodeId::new(self.next_id.max(1));
        self.next_id = id.get() + 1;
        self.nodes.insert(
            id,
            NodeInfo {
                id,
                owner: owner.clone(),
                pool,
                compute_rating,
                active: true,
            },
        );
        tracing::debug!(node_id = id.get(), owner = %owner, pool = pool.get(), "node registered");
        Ok(id)
    }

    fn unregister_node(&mut self, node: NodeId) -> Result<()> {
        let info = self.nodes.get_mut(&node).ok_or(LuminoError::NodeNotFound(node))?;
        info.active = false;
        Ok(())
    }
}

// Collaborator behaviour exercised together

#[cfg(test)]
mod tests {
    use crate::*;
    use lumino_types::*;

    #[test]
    fn test_registry_pool_membership() {
        let mut registry = MemoryRegistry::new();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");

        let n1 = registry.register_node(&alice, PoolId::new(1), 10).unwrap();
        let n2 = registry.register_node(&bob, PoolId::new(1), 10).unwrap();
        let n3 = registry.register_node(&bob, PoolId::new(2), 5).unwrap();

        assert_eq!(n1, NodeId::new(1));
        assert_eq!(registry.nodes_in_pool(PoolId::new(1)), vec![n1, n2]);
        assert_eq!(registry.nodes_in_pool(PoolId::new(2)), vec![n3]);
        assert_eq!(registry.nodes_of(&bob), vec![n2, n3]);

        registry.unregister_node(n1).unwrap();
        assert!(!registry.is_active(n1));
        assert_eq!(registry.nodes_in_pool(PoolId::new(1)), vec![n2]);
        // Ownership survives deactivation
        assert_eq!(registry.owner_of(n1), Some(alice));
    }

    #[test]
    fn test_require_owner() {
        let mut registry = MemoryRegistry::new();
        let alice = AccountId::new("alice");
        let node = registry.register_node(&alice, PoolId::new(1), 1).unwrap();

        assert!(registry.require_owner(node, &alice).is_ok());
        assert!(matches!(
            registry.require_owner(node, &AccountId::new("mallory")),
            Err(LuminoError::NotAuthorized(..))
        ));
        assert!(matches!(
            registry.require_owner(NodeId::new(99), &alice),
            Err(LuminoError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_whitelist_and_roles() {
        let mut whitelist = MemoryWhitelist::new();
        whitelist.add("cp1");
        assert!(whitelist.is_eligible(&AccountId::new("cp1")));
        assert!(!whitelist.is_eligible(&AccountId::new("cp2")));
        assert!(MemoryWhitelist::open().is_eligible(&AccountId::new("anyone")));

        let mut access = MemoryAccess::with_admin("root");
        assert!(access.has_role(&AccountId::new("root"), Role::Admin));
        assert!(!access.has_role(&AccountId::new("cp1"), Role::Admin));
        access.grant("cp1", Role::Admin);
        assert!(access.has_role(&AccountId::new("cp1"), Role::Admin));
        access.revoke(&AccountId::new("root"), Role::Admin);
        assert!(!access.has_role(&AccountId::new("root"), Role::Admin));
    }

    #[test]
    fn test_ledger_minimum_balance() {
        let mut ledger = MemoryLedger::new();
        let acc = AccountId::new("user");
        ledger.deposit(&acc, Amount::from_units(10)).unwrap();

        assert!(ledger.has_minimum_balance(&acc, Amount::from_units(10)));
        assert!(!ledger.has_minimum_balance(&acc, Amount::from_units(11)));
        assert_eq!(ledger.list_accounts(), vec![acc]);
    }
}

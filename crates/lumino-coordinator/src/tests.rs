// Registration, configuration and status

#[cfg(test)]
mod tests {
    use crate::*;
    use lumino_clock::{ManualTime, PhaseDurations};
    use lumino_ledger::{MemoryAccess, MemoryLedger, MemoryRegistry, MemoryWhitelist, NodeRegistry};
    use lumino_types::*;

    fn coordinator(time: &ManualTime) -> Coordinator {
        let mut ledger = MemoryLedger::new();
        let mut whitelist = MemoryWhitelist::new();
        for (name, balance) in [("rich", 100), ("poor", 5)] {
            ledger.deposit(&AccountId::new(name), Amount::from_units(balance)).unwrap();
            whitelist.add(name);
        }
        ledger.deposit(&AccountId::new("outsider"), Amount::from_units(100)).unwrap();

        Coordinator::new(
            ProtocolConfig::default(),
            Collaborators {
                time: Box::new(time.clone()),
                ledger: Box::new(ledger),
                registry: Box::new(MemoryRegistry::new()),
                whitelist: Box::new(whitelist),
                access: Box::new(MemoryAccess::with_admin("admin")),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_register_requires_whitelist_and_stake() {
        let time = ManualTime::new(0);
        let mut c = coordinator(&time);

        let err = c.register_node(&AccountId::new("outsider"), PoolId::new(1), 1).unwrap_err();
        assert!(matches!(err.protocol(), Some(LuminoError::NotWhitelisted(_))));

        // Default stake is 10 units per compute unit.
        let err = c.register_node(&AccountId::new("poor"), PoolId::new(1), 1).unwrap_err();
        assert!(matches!(
            err.protocol(),
            Some(LuminoError::InsufficientStake { compute_rating: 1, .. })
        ));
        let err = c.register_node(&AccountId::new("rich"), PoolId::new(1), 11).unwrap_err();
        assert!(matches!(err.protocol(), Some(LuminoError::InsufficientStake { .. })));

        let node = c.register_node(&AccountId::new("rich"), PoolId::new(1), 10).unwrap();
        assert_eq!(c.registry().nodes_in_pool(PoolId::new(1)), vec![node]);
        assert_eq!(c.events().len(), 1);
    }

    #[test]
    fn test_unregister_requires_owner() {
        let time = ManualTime::new(0);
        let mut c = coordinator(&time);
        let rich = AccountId::new("rich");
        let node = c.register_node(&rich, PoolId::new(1), 1).unwrap();

        let err = c.unregister_node(&AccountId::new("poor"), node).unwrap_err();
        assert!(matches!(err.protocol(), Some(LuminoError::NotAuthorized(..))));

        c.unregister_node(&rich, node).unwrap();
        assert!(!c.registry().is_active(node));
        assert!(c.registry().nodes_in_pool(PoolId::new(1)).is_empty());
    }

    #[test]
    fn test_update_config_requires_admin() {
        let time = ManualTime::new(0);
        let mut c = coordinator(&time);
        let config = ProtocolConfig {
            phases: PhaseDurations::uniform(30),
            ..ProtocolConfig::default()
        };

        let err = c.update_config(&AccountId::new("rich"), config.clone()).unwrap_err();
        assert!(matches!(err.protocol(), Some(LuminoError::NotAuthorized(..))));

        let mut invalid = config.clone();
        invalid.scheduler.max_jobs_per_node = 0;
        let err = c.update_config(&AccountId::new("admin"), invalid).unwrap_err();
        assert!(matches!(err.protocol(), Some(LuminoError::Config(_))));

        c.update_config(&AccountId::new("admin"), config.clone()).unwrap();
        assert_eq!(c.config(), &config);

        // The new schedule opens epoch 1 at the moment of the change.
        assert_eq!(c.clock().base_epoch(), 1);
        time.set(60);
        let at = c.phase_info();
        assert_eq!((at.epoch, at.phase), (1, Phase::Elect));
        time.set(45);
        assert_eq!(c.phase_info().phase, Phase::Reveal);

        // Changing only the incentives keeps the schedule.
        let mut same_phases = config.clone();
        same_phases.incentives.disputer_reward = Amount::from_units(9);
        c.update_config(&AccountId::new("admin"), same_phases).unwrap();
        assert_eq!(c.clock().base_epoch(), 1);
    }

    #[test]
    fn test_phase_read_on_every_call() {
        let time = ManualTime::new(0);
        let c = coordinator(&time);
        assert_eq!(c.phase_info().phase, Phase::Commit);

        let epoch_length = PhaseDurations::default().epoch_length();
        time.set(epoch_length * 3 + PhaseDurations::default().commit);
        let at = c.phase_info();
        assert_eq!((at.epoch, at.phase), (3, Phase::Reveal));
    }

    #[test]
    fn test_status_snapshot() {
        let time = ManualTime::new(0);
        let mut c = coordinator(&time);
        c.register_node(&AccountId::new("rich"), PoolId::new(1), 1).unwrap();

        let status = c.status();
        assert_eq!(status.epoch, 0);
        assert_eq!(status.phase, Phase::Commit);
        assert_eq!(status.leader, None);
        assert_eq!(status.event_count, 1);
        assert_eq!(status.head_hash, c.events().head_hash());
        assert_eq!(status.last_settled_epoch, None);
    }

    #[test]
    fn test_coordinator_error_benign() {
        let err: CoordinatorError = LuminoError::EpochAlreadyProcessed(4).into();
        assert!(err.is_benign());
        assert!(!CoordinatorError::ChannelClosed.is_benign());
    }
}

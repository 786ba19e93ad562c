mod common;

use common::*;
use lumino_clock::PhaseDurations;
use lumino_coordinator::{ProtocolConfig, ProtocolEvent};
use lumino_incentives::AdjustmentKind;
use lumino_leader::compute_commitment;
use lumino_ledger::Ledger;
use lumino_types::{AccountId, Amount, JobStatus, LuminoError, Phase};

#[test]
fn basic_election_never_picks_unrevealed_node() {
    let mut h = harness(3);
    for (i, s) in [b"s1", b"s2", b"s3"].iter().enumerate() {
        h.commit(1, i, *s);
    }
    h.reveal(1, 0, b"s1");
    h.reveal(1, 1, b"s2");

    h.goto(1, Phase::Elect);
    let result = h.coordinator.elect_leader().unwrap();
    assert!(result.leader == h.nodes[0] || result.leader == h.nodes[1]);
    assert_ne!(result.leader, h.nodes[2]);
    assert_eq!(result.candidates, 2);

    // Memoized for the rest of the epoch.
    h.time.advance(5);
    assert_eq!(h.coordinator.elect_leader().unwrap(), result);
    assert_eq!(h.coordinator.current_leader(), Some(result.leader));
}

#[test]
fn election_without_reveals_fails() {
    let mut h = harness(2);
    h.commit(1, 0, b"s1");
    h.goto(1, Phase::Elect);

    let err = h.coordinator.elect_leader().unwrap_err();
    assert_eq!(err.protocol(), Some(&LuminoError::NoRevealsSubmitted(1)));
}

#[test]
fn idempotent_settlement() {
    let mut h = harness(3);
    h.run_election(5, &[0, 1, 2]);
    h.run_election(6, &[0, 1]);
    h.goto(7, Phase::Commit);

    h.coordinator.settle(&h.disputer, 5).unwrap();
    let balances = h.coordinator.ledger().snapshot();
    let events = h.coordinator.events().len();

    let err = h.coordinator.settle(&h.disputer, 5).unwrap_err();
    assert!(err.is_benign());
    assert_eq!(err.protocol(), Some(&LuminoError::EpochAlreadyProcessed(5)));
    assert_eq!(h.coordinator.ledger().snapshot(), balances);
    assert_eq!(h.coordinator.events().len(), events);

    h.coordinator.settle(&h.disputer, 6).unwrap();
    assert!(h.coordinator.is_settled(5));
    assert!(h.coordinator.is_settled(6));
    assert_eq!(h.balance(&h.disputer), units(4));
}

#[test]
fn leader_penalty_when_no_assignment_round() {
    let mut h = harness(3);

    let leader = h.run_election(1, &[0, 1, 2]);
    let owner = h.owner_of(leader);

    h.goto(1, Phase::Dispute);
    let report = h.coordinator.settle(&h.disputer, 1).unwrap();

    assert!(!report.assignment_round_started);
    // 100 - 15 penalty + 1 availability
    assert_eq!(h.balance(&owner), units(86));
    assert_eq!(h.coordinator.penalty_count(&owner), 1);
    assert_eq!(h.balance(&h.disputer), units(2));
}

#[test]
fn leader_rewarded_after_assignment_round() {
    let mut h = harness(2);
    let leader = h.run_election(1, &[0, 1]);
    let owner = h.owner_of(leader);

    h.goto(1, Phase::Execute);
    h.coordinator.start_assignment_round(&owner).unwrap();
    h.goto(1, Phase::Dispute);
    h.coordinator.settle(&h.disputer, 1).unwrap();

    // Leader reward plus availability.
    assert_eq!(h.balance(&owner), units(106));
    assert_eq!(h.coordinator.penalty_count(&owner), 0);
}

#[test]
fn job_confirmation_penalty() {
    let mut h = harness(1);
    let user = h.user.clone();
    let job = h.coordinator.submit_job(&user, POOL, "llm-7b", "{}").unwrap();
    assert_eq!(h.coordinator.pending_jobs(POOL), 1);

    let leader = h.run_election(1, &[0]);
    let owner = h.owner_of(leader);
    h.goto(1, Phase::Execute);
    let report = h.coordinator.start_assignment_round(&owner).unwrap();
    assert_eq!(report.assigned.len(), 1);
    assert_eq!(h.coordinator.pending_jobs(POOL), 0);
    assert_eq!(h.coordinator.assigned_node(job), Some(h.nodes[0]));

    h.goto(1, Phase::Dispute);
    let report = h.coordinator.settle(&h.disputer, 1).unwrap();

    assert_eq!(report.penalties().count(), 1);
    // 100 + 5 leader + 1 availability - 10 unconfirmed
    assert_eq!(h.balance(&owner), units(96));
    assert_eq!(h.coordinator.penalty_count(&owner), 1);
}

#[test]
fn confirmed_job_is_not_penalized() {
    let mut h = harness(1);
    let user = h.user.clone();
    let job = h.coordinator.submit_job(&user, POOL, "llm-7b", "{}").unwrap();

    let leader = h.run_election(1, &[0]);
    let owner = h.owner_of(leader);
    h.goto(1, Phase::Execute);
    h.coordinator.start_assignment_round(&owner).unwrap();

    h.goto(1, Phase::Confirm);
    h.coordinator.confirm_job(&owner, job).unwrap();
    h.coordinator.complete_job(&owner, job).unwrap();
    assert_eq!(h.coordinator.job(job).unwrap().status, JobStatus::Complete);

    h.goto(1, Phase::Dispute);
    let report = h.coordinator.settle(&h.disputer, 1).unwrap();

    assert_eq!(report.penalties().count(), 0);
    assert_eq!(h.balance(&owner), units(106));
    assert_eq!(h.coordinator.penalty_count(&owner), 0);
}

#[test]
fn slashing_zeroes_balance_and_resets_counter() {
    let mut h = harness(1);
    let owner = h.owners[0].clone();

    // Lazy leader twice: counter reaches one below the threshold.
    for epoch in 1..=2 {
        h.run_election(epoch, &[0]);
        h.goto(epoch, Phase::Dispute);
        h.coordinator.settle(&h.disputer, epoch).unwrap();
    }
    assert_eq!(h.coordinator.penalty_count(&owner), 2);
    assert_eq!(h.balance(&owner), units(72));

    h.run_election(3, &[0]);
    h.goto(3, Phase::Dispute);
    let report = h.coordinator.settle(&h.disputer, 3).unwrap();

    assert_eq!(report.slashed(), vec![&owner]);
    // The availability reward lands before the slash, not after it.
    assert!(h.balance(&owner).is_zero());
    assert_eq!(
        report.adjustments.last().map(|adj| adj.kind),
        Some(AdjustmentKind::Slash)
    );
    assert_eq!(h.coordinator.penalty_count(&owner), 0);
    assert!(h
        .coordinator
        .events()
        .records()
        .iter()
        .any(|r| matches!(&r.event, ProtocolEvent::Slashed { epoch: 3, account, .. } if *account == owner)));
}

#[test]
fn incentives_only_move_inside_settle() {
    let mut h = harness(2);
    let user = h.user.clone();
    let job = h.coordinator.submit_job(&user, POOL, "llm", "{}").unwrap();
    let start = h.coordinator.ledger().snapshot();

    let leader = h.run_election(1, &[0, 1]);
    let owner = h.owner_of(leader);
    h.goto(1, Phase::Execute);
    h.coordinator.start_assignment_round(&owner).unwrap();
    let worker = h.owner_of(h.coordinator.assigned_node(job).unwrap());
    h.goto(1, Phase::Confirm);
    h.coordinator.confirm_job(&worker, job).unwrap();

    assert_eq!(h.coordinator.ledger().snapshot(), start);
    let incentive_events = |h: &Harness| {
        h.coordinator
            .events()
            .records()
            .iter()
            .filter(|r| {
                matches!(
                    r.event,
                    ProtocolEvent::RewardApplied { .. }
                        | ProtocolEvent::PenaltyApplied { .. }
                        | ProtocolEvent::Slashed { .. }
                )
            })
            .count()
    };
    assert_eq!(incentive_events(&h), 0);

    h.goto(1, Phase::Dispute);
    let report = h.coordinator.settle(&h.disputer, 1).unwrap();
    assert_eq!(incentive_events(&h), report.adjustments.len());

    // A later settle of the same epoch adds nothing.
    h.goto(2, Phase::Dispute);
    assert!(h.coordinator.settle(&h.disputer, 1).is_err());
    assert_eq!(incentive_events(&h), report.adjustments.len());

    let settled = h
        .coordinator
        .events()
        .records()
        .iter()
        .filter(|r| matches!(r.event, ProtocolEvent::EpochSettled { epoch: 1, .. }))
        .count();
    assert_eq!(settled, 1);
    assert!(h.coordinator.events().verify());
    assert!(report
        .adjustments
        .iter()
        .all(|adj| adj.kind == AdjustmentKind::Reward));
}

#[test]
fn only_the_leader_starts_assignment() {
    let mut h = harness(2);
    let leader = h.run_election(1, &[0, 1]);
    let other = h.owners[1 - h.index_of(leader)].clone();

    h.goto(1, Phase::Execute);
    let err = h.coordinator.start_assignment_round(&other).unwrap_err();
    assert!(matches!(err.protocol(), Some(LuminoError::NotCurrentLeader { .. })));

    let owner = h.owner_of(leader);
    h.goto(1, Phase::Confirm);
    let err = h.coordinator.start_assignment_round(&owner).unwrap_err();
    assert!(matches!(err.protocol(), Some(LuminoError::InvalidPhase { .. })));
    assert!(!h.coordinator.scheduler().assignment_round_started(1));
}

#[test]
fn failed_operations_leave_no_trace() {
    let mut h = harness(2);
    let events = h.coordinator.events().len();

    // Wrong phase.
    h.goto(1, Phase::Reveal);
    let err = h
        .coordinator
        .submit_commitment(&h.owners[0], 1, h.nodes[0], compute_commitment(b"x"))
        .unwrap_err();
    assert!(matches!(err.protocol(), Some(LuminoError::InvalidPhase { .. })));

    // Wrong owner.
    h.goto(1, Phase::Commit);
    let err = h
        .coordinator
        .submit_commitment(&h.owners[1], 1, h.nodes[0], compute_commitment(b"x"))
        .unwrap_err();
    assert!(matches!(err.protocol(), Some(LuminoError::NotAuthorized(..))));

    // Settling an epoch still in progress.
    let err = h.coordinator.settle(&h.disputer, 1).unwrap_err();
    assert!(!err.is_benign());

    assert_eq!(h.coordinator.events().len(), events);
    assert!(h.coordinator.committed_nodes(1).is_empty());
}

#[test]
fn payment_moves_fee_to_node_owner() {
    let mut h = harness(1);
    let user = h.user.clone();
    let job = h.coordinator.submit_job(&user, POOL, "llm", "{}").unwrap();
    let leader = h.run_election(1, &[0]);
    let owner = h.owner_of(leader);
    h.goto(1, Phase::Execute);
    h.coordinator.start_assignment_round(&owner).unwrap();
    h.goto(1, Phase::Confirm);
    h.coordinator.confirm_job(&owner, job).unwrap();
    h.coordinator.complete_job(&owner, job).unwrap();

    let payment = h.coordinator.process_payment(&user, job).unwrap();
    assert_eq!(payment.to, owner);
    assert_eq!(h.balance(&user), units(99));
    assert_eq!(h.balance(&owner), units(101));

    let err = h.coordinator.process_payment(&owner, job).unwrap_err();
    assert_eq!(err.protocol(), Some(&LuminoError::JobAlreadyPaid(job)));
}

#[test]
fn failed_settlement_is_rolled_back() {
    let mut h = harness(2);
    let leader = h.run_election(1, &[0, 1]);
    let owner = h.owner_of(leader);
    // The disputer reward cannot be credited on top of this.
    let disputer = h.disputer.clone();
    h.coordinator
        .ledger_mut()
        .increase_balance(&disputer, Amount::from_raw(u128::MAX))
        .unwrap();

    h.goto(1, Phase::Dispute);
    let balances = h.coordinator.ledger().snapshot();
    let events = h.coordinator.events().len();

    let err = h.coordinator.settle(&disputer, 1).unwrap_err();
    assert!(!err.is_benign());
    assert!(matches!(err.protocol(), Some(LuminoError::InvalidAmount(_))));
    assert_eq!(h.coordinator.ledger().snapshot(), balances);
    assert_eq!(h.coordinator.events().len(), events);
    assert!(!h.coordinator.is_settled(1));
    assert_eq!(h.coordinator.penalty_count(&owner), 0);

    // Another disputer can still settle the epoch.
    let other = AccountId::new("other-disputer");
    h.coordinator.settle(&other, 1).unwrap();
    assert!(h.coordinator.is_settled(1));
    assert_eq!(h.coordinator.penalty_count(&owner), 1);
}

#[test]
fn phase_change_never_reuses_epoch_numbers() {
    let mut h = harness(3);
    h.run_election(5, &[0, 1, 2]);
    h.goto(5, Phase::Dispute);
    h.coordinator.settle(&h.disputer, 5).unwrap();

    h.goto(9, Phase::Commit);
    let config = ProtocolConfig {
        phases: PhaseDurations::uniform(18),
        ..test_config()
    };
    let admin = h.admin.clone();
    h.coordinator.update_config(&admin, config).unwrap();

    let at = h.coordinator.phase_info();
    assert_eq!((at.epoch, at.phase), (10, Phase::Commit));
    h.time.advance(18 * 6 * 3);
    assert_eq!(h.coordinator.phase_info().epoch, 13);

    // Earlier epochs keep their state; the new epoch starts clean.
    assert!(h.coordinator.is_settled(5));
    assert_eq!(h.coordinator.committed_nodes(5).len(), 3);
    assert!(h.coordinator.committed_nodes(14).is_empty());

    h.run_election(14, &[0, 1]);
    h.goto(14, Phase::Dispute);
    h.coordinator.settle(&h.disputer, 14).unwrap();
    assert!(h.coordinator.is_settled(14));
    assert!(h.coordinator.events().verify());
}

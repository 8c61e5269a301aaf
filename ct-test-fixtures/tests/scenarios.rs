//! End-to-end flows through SDK, simulated prover and ledger:
//! 1. Init
//! 2. Deposit then withdraw
//! 3. Transfer then apply
//! 4. Partial apply over a three-entry queue
//! 5. Required auditors

use ct_common::Fr;
use ct_ledger::{ErrorKind, LedgerError};
use ct_sdk::{decrypt_state, derive_shared_key, generate_commitment, generate_otk};
use ct_test_fixtures::{default_target, init_tracing, World, CAST};

fn world() -> World {
    init_tracing();
    World::new()
}

// ═══════════════════════════════════════════════════════════════════════════════
// INIT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_init_registers_derived_key() {
    let world = world();
    let alice = &CAST.alice;
    world.init(alice).unwrap();

    let account = world.sdk.account(&alice.address).unwrap();
    assert_eq!(account.nonce(), 0);
    assert_ne!(account.state.commitment, Fr::zero());
    assert_ne!(account.state.e_amount, Fr::zero());
    assert_eq!(account.public_point, alice.keys.public_point);
    assert!(account.pending_transfers.is_empty());
    assert_eq!(world.balance(alice).unwrap(), 0);
}

#[test]
fn test_second_init_is_rejected() {
    let world = world();
    let alice = &CAST.alice;
    world.init(alice).unwrap();

    let params = world.sdk.init(&alice.keys, &[]).unwrap();
    let err = world
        .ledger
        .submit(|ledger| ledger.c_init(&alice.address, &params))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountAlreadyInitialized(_)));
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEPOSIT / WITHDRAW
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_deposit_then_withdraw() {
    let world = world();
    let alice = &CAST.alice;
    world.init(alice).unwrap();
    world.fund(alice, 100).unwrap();
    assert_eq!(world.nonce(alice).unwrap(), 1);

    let params = world
        .sdk
        .withdraw(&alice.address, &alice.keys, 10, &[])
        .unwrap();
    assert_eq!(params.amount, 10);
    world
        .ledger
        .submit(|ledger| ledger.c_withdraw(&alice.address, &params))
        .unwrap();

    let account = world.sdk.account(&alice.address).unwrap();
    assert_eq!(account.nonce(), 2);
    assert_eq!(world.balance(alice).unwrap(), 90);

    let otk = generate_otk(&alice.keys.private_scalar, 2, &default_target());
    assert_eq!(
        generate_commitment(&Fr::from(90u64), &otk),
        account.state.commitment
    );

    let (public, pool) = world
        .ledger
        .read(|ledger| (ledger.balance_of(&alice.address), ledger.pool_balance()))
        .unwrap();
    assert_eq!(public, 10);
    assert_eq!(pool, 90);
}

#[test]
fn test_deposit_needs_public_balance() {
    let world = world();
    let alice = &CAST.alice;
    world.init(alice).unwrap();

    let params = world
        .sdk
        .deposit(&alice.address, &alice.keys, 5, &[])
        .unwrap();
    let err = world
        .ledger
        .submit(|ledger| ledger.c_deposit(&alice.address, &params))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientPublicBalance { .. }));
    assert_eq!(world.nonce(alice).unwrap(), 0);
}

#[test]
fn test_withdraw_more_than_balance_fails_before_submission() {
    let world = world();
    let alice = &CAST.alice;
    world.init(alice).unwrap();
    world.fund(alice, 10).unwrap();

    assert!(world
        .sdk
        .withdraw(&alice.address, &alice.keys, 11, &[])
        .is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFER / APPLY
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_transfer_then_apply() {
    let world = world();
    let (alice, bob) = (&CAST.alice, &CAST.bob);
    world.init_all(&[alice, bob]).unwrap();
    world.fund(alice, 100).unwrap();

    world.transfer(alice, bob, 10).unwrap();
    assert_eq!(world.pending_len(bob).unwrap(), 1);
    assert_eq!(world.balance(alice).unwrap(), 90);

    world.apply(bob, &[0]).unwrap();
    assert_eq!(world.balance(bob).unwrap(), 10);
    assert_eq!(world.pending_len(bob).unwrap(), 0);
    assert_eq!(world.nonce(bob).unwrap(), 1);
}

#[test]
fn test_partial_apply_keeps_middle_entry() {
    let world = world();
    let (alice, bob) = (&CAST.alice, &CAST.bob);
    world.init_all(&[alice, bob]).unwrap();
    world.fund(alice, 100).unwrap();
    for amount in [1, 2, 3] {
        world.transfer(alice, bob, amount).unwrap();
    }

    world.apply(bob, &[0, 2]).unwrap();

    let account = world.sdk.account(&bob.address).unwrap();
    assert_eq!(account.pending_transfers.len(), 1);
    let remaining = &account.pending_transfers[0];
    let shared = derive_shared_key(&bob.keys.private_scalar, &alice.keys.public_point).unwrap();
    assert_eq!(
        decrypt_state(&shared, &remaining.payload, &default_target()).unwrap(),
        2
    );
    assert_eq!(world.balance(bob).unwrap(), 4);

    world.apply(bob, &[0]).unwrap();
    assert_eq!(world.balance(bob).unwrap(), 6);
}

#[test]
fn test_apply_and_transfer_forwards_received_funds() {
    let world = world();
    let (alice, bob, charlie) = (&CAST.alice, &CAST.bob, &CAST.charlie);
    world.init_all(&[alice, bob, charlie]).unwrap();
    world.fund(alice, 50).unwrap();
    world.transfer(alice, bob, 20).unwrap();
    world.transfer(alice, bob, 5).unwrap();

    let params = world
        .sdk
        .apply_and_transfer(
            &bob.address,
            &bob.keys,
            &[1],
            &charlie.address,
            4,
            &[],
            b"memo".to_vec(),
        )
        .unwrap();
    world
        .ledger
        .submit(|ledger| ledger.c_apply_and_transfer(&bob.address, &params))
        .unwrap();

    assert_eq!(world.balance(bob).unwrap(), 1);
    assert_eq!(world.pending_len(bob).unwrap(), 1);
    world.apply(charlie, &[0]).unwrap();
    assert_eq!(world.balance(charlie).unwrap(), 4);
    world.apply(bob, &[0]).unwrap();
    assert_eq!(world.balance(bob).unwrap(), 21);
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUDITORS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_required_auditor_on_state_reports() {
    let world = world();
    let (alice, auditor) = (&CAST.alice, &CAST.auditor);
    world.init_all(&[alice, auditor]).unwrap();
    world
        .ledger
        .submit(|ledger| ledger.add_required_auditor(&alice.address, &auditor.address))
        .unwrap();
    world
        .ledger
        .submit(|ledger| ledger.mint(alice.address, 100))
        .unwrap();

    let params = world
        .sdk
        .deposit(&alice.address, &alice.keys, 100, &[])
        .unwrap();
    let mut without_report = params.clone();
    without_report.state_audit_reports.clear();
    let err = world
        .ledger
        .submit(|ledger| ledger.c_deposit(&alice.address, &without_report))
        .unwrap_err();
    assert!(matches!(err, LedgerError::RequiredAuditorNotFound(a) if a == auditor.address));
    assert_eq!(err.kind(), ErrorKind::Policy);
    assert!(err.to_string().contains("required auditor"));

    world
        .ledger
        .submit(|ledger| ledger.c_deposit(&alice.address, &params))
        .unwrap();

    let account = world.sdk.account(&alice.address).unwrap();
    let report = account
        .audit_reports
        .iter()
        .find(|r| r.auditor == auditor.address)
        .unwrap();
    let audited = world
        .sdk
        .decrypt_audit_report(
            &auditor.keys.private_scalar,
            &alice.address,
            &report.e_otk,
            &account.state,
        )
        .unwrap();
    assert_eq!(audited, 100);
}

#[test]
fn test_recipient_auditor_sees_incoming_transfer() {
    let world = world();
    let (alice, bob, auditor) = (&CAST.alice, &CAST.bob, &CAST.auditor);
    world.init_all(&[alice, bob, auditor]).unwrap();
    world.fund(alice, 30).unwrap();
    world
        .ledger
        .submit(|ledger| ledger.add_required_auditor(&bob.address, &auditor.address))
        .unwrap();

    world.transfer(alice, bob, 12).unwrap();

    let pending = world.sdk.account(&bob.address).unwrap().pending_transfers[0].clone();
    let report = pending
        .audit_reports
        .iter()
        .find(|r| r.auditor == auditor.address)
        .unwrap();
    let audited = world
        .sdk
        .decrypt_audit_report(
            &auditor.keys.private_scalar,
            &alice.address,
            &report.e_otk,
            &pending.payload,
        )
        .unwrap();
    assert_eq!(audited, 12);
}

#[test]
fn test_wrong_counterparty_fails_audit() {
    let world = world();
    let (alice, bob, auditor) = (&CAST.alice, &CAST.bob, &CAST.auditor);
    world.init_all(&[alice, bob, auditor]).unwrap();
    world.fund(alice, 30).unwrap();
    let account = world.sdk.account(&alice.address).unwrap();
    let reports = world
        .sdk
        .create_state_audit_report(&alice.keys.private_scalar, 1, &[auditor.address])
        .unwrap();

    assert_eq!(
        world
            .sdk
            .decrypt_audit_report(
                &auditor.keys.private_scalar,
                &alice.address,
                &reports[0].e_otk,
                &account.state,
            )
            .unwrap(),
        30
    );
    assert!(world
        .sdk
        .decrypt_audit_report(
            &auditor.keys.private_scalar,
            &bob.address,
            &reports[0].e_otk,
            &account.state,
        )
        .is_err());
}

//! Test fixtures for confidential transfers.
//!
//! [`SimulatedProver`] and [`SimulatedVerifier`] stand in for the circuit
//! backend, and [`World`] wires them to a ledger and an SDK with a fixed
//! cast of users.

pub mod prover;
pub mod verifier;
pub mod world;

use once_cell::sync::OnceCell;

pub use prover::SimulatedProver;
pub use verifier::{seal, SimulatedVerifier};
pub use world::{default_target, Cast, Ledger, Sdk, User, World, CAST, CHAIN_ID, CONTRACT};

static TRACING: OnceCell<()> = OnceCell::new();

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "ct_ledger=warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

//! Small CLI harness for exercising the `LEDGER` rule against a fixture.
//!
//! There is no node to run; this binary loads protocol parameters and a
//! JSON-encoded `(environment, UTxOState, DelegationState, Transaction)`
//! fixture and prints the result of applying `LEDGER` to stdout.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use shelley_ledger_core::credential::{Hash28, Network};
use shelley_ledger_core::crypto::Blake2bHasher;
use shelley_ledger_core::params::ProtocolParams;
use shelley_ledger_core::rules::ledger::apply_ledger;
use shelley_ledger_core::state::{DelegationState, LedgerEnv, UTxOState};
use shelley_ledger_core::tx::Transaction;
use tracing::{error, info};

/// Apply a transaction to a UTxO/delegation state under the `LEDGER` rule.
#[derive(Parser, Debug)]
#[command(name = "ledger-cli", about = "Apply a transaction to a ledger state fixture")]
struct Cli {
    /// Path to a JSON file containing protocol parameters. Defaults built in
    /// if omitted.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Path to a JSON fixture: `{ slot, tx_index, current_epoch, network,
    /// stake_pools, utxo_state, deleg_state, tx }`.
    #[arg(long)]
    fixture: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Fixture {
    slot: u64,
    tx_index: u32,
    current_epoch: u64,
    network: Network,
    stake_pools: BTreeSet<Hash28>,
    utxo_state: UTxOState,
    deleg_state: DelegationState,
    tx: Transaction,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let pparams = match &cli.params {
        Some(path) => ProtocolParams::load_from_file(path)
            .with_context(|| format!("failed to load protocol parameters from {}", path.display()))?,
        None => ProtocolParams::default(),
    };

    let fixture_json = std::fs::read_to_string(&cli.fixture)
        .with_context(|| format!("failed to read fixture from {}", cli.fixture.display()))?;
    let fixture: Fixture = serde_json::from_str(&fixture_json).context("failed to parse fixture JSON")?;

    let env = LedgerEnv {
        slot: fixture.slot,
        tx_index: fixture.tx_index,
        current_epoch: fixture.current_epoch,
        network: fixture.network,
        pparams: &pparams,
        stake_pools: &fixture.stake_pools,
    };

    info!(slot = fixture.slot, "applying LEDGER rule");
    match apply_ledger::<Blake2bHasher>(&env, &fixture.utxo_state, &fixture.deleg_state, &fixture.tx) {
        Ok((utxo_state, deleg_state)) => {
            let output = serde_json::json!({
                "utxo_state": utxo_state,
                "deleg_state": deleg_state,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("serializing LEDGER result")?
            );
            Ok(())
        }
        Err(failures) => {
            error!(?failures, "transaction rejected");
            eprintln!("{:#?}", failures);
            std::process::exit(1);
        }
    }
}

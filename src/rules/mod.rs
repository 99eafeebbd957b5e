//! State-transition rules (§4.F–§4.J): plain functions returning
//! `Result<State, Vec<Failure>>`, per §9's re-architecture of the source's
//! small-step transition-system framework.

pub mod delegation;
pub mod ledger;
pub mod utxo;
pub mod utxow;

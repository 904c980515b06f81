//! Zero-knowledge proof machinery: Fiat-Shamir challenge derivation, the
//! disclosure proof builder and its output, and the cached non-revocation
//! prover.

mod challenge;
mod disclosure;
mod nonrevocation;

pub use self::{challenge::*, disclosure::*, nonrevocation::*};

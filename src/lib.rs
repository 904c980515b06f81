//! This crate implements the prover side of an Idemix-style anonymous-credential
//! system over a strong-RSA group:
//! - Camenisch-Lysyanskaya (CL) multi-message signatures with unlinkable
//!   re-randomization.
//! - Selective-disclosure proofs: Schnorr-style zero-knowledge proofs of
//!   knowledge of a CL signature that reveal a chosen subset of the signed
//!   attributes and hide the rest.
//! - Linked sub-proofs for bounded attributes and for non-revocation against an
//!   RSA accumulator, tied to the main proof through shared commitment
//!   randomizers under a single Fiat-Shamir challenge.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![warn(future_incompatible)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod camenisch_lysyanskaya;
pub mod credential;
pub mod keys;
pub mod params;
pub mod proofs;
pub mod rangeproof;
pub mod revocation;

mod arith;

pub use crate::common::Rng;

use thiserror::Error;

/// Error types that may arise from credential and proof operations.
///
/// Every error is fatal to the proof construction it occurred in: the caller
/// discards the builder and starts over. Errors from sub-proofs bubble up
/// unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Caused by attempting to use a key with an incompatible attribute count.
    #[error("public key supports {capacity} attributes, got {got}")]
    ParameterMismatch {
        /// The number of bases available in the public key.
        capacity: usize,
        /// The number of attributes requested.
        got: usize,
    },
    /// Caused by a range statement that addresses a disclosed attribute.
    #[error("range statements on disclosed attribute {0} are not supported")]
    RangeOnDisclosedAttribute(usize),
    /// Caused by attempting to build a range proof on an attribute that does
    /// not satisfy the statement.
    #[error("attribute {0} does not satisfy the range statement")]
    RangeStatementUnsatisfied(usize),
    /// Caused by requesting a non-revocation proof from a credential that
    /// carries no revocation witness.
    #[error("credential has no nonrevocation witness")]
    MissingWitness,
    /// Caused by a revocation witness whose value does not appear among the
    /// credential's attributes.
    #[error("revocation attribute not included in credential")]
    RevocationAttributeMissing,
    /// Caused by using a non-revocation proof builder before its commitment
    /// phase has run.
    #[error("cannot use noninitialized nonrevocation proof builder")]
    UninitializedBuilder,
    /// A mandatory externally-supplied randomizer was not provided.
    #[error("missing required randomizer \"{0}\"")]
    MissingRandomizer(&'static str),
    /// The operating system's random number source failed.
    #[error("system randomness source failed")]
    RandomnessFailure,
    /// Caused by a value that has no inverse modulo the key's modulus. Only
    /// possible with malformed inputs.
    #[error("value has no inverse modulo n")]
    ModularInverseFailure,
    /// No prime of the requested shape was found within the attempt budget.
    #[error("failed to generate a prime of the requested size")]
    PrimeGenerationFailure,
}

pub(crate) mod common {
    pub use crate::Error;
    pub use num_bigint::BigInt;

    /// A trait synonym for a cryptographically secure random number generator. This trait is
    /// blanket-implemented for all valid types and will never need to be implemented by-hand.
    pub trait Rng: rand::CryptoRng + rand::RngCore {}
    impl<T: rand::CryptoRng + rand::RngCore> Rng for T {}
}

//! Schnorr-style constraints that a hidden attribute satisfies a bound.
//!
//! **A range statement cannot be used alone!** It is only meaningful in
//! conjunction with a disclosure proof: the commitment randomizer of the
//! constrained attribute is shared between the two, so the attribute response
//! of the main proof is the exact value a verifier feeds back into the range
//! statement's reconstruction.
//!
//! ## Intuition
//!
//! For a statement `m >= bound` (or `m <= bound`) the prover forms a
//! commitment `C = R_i^{delta} * S^v` to the difference
//! `delta = sign * (m - bound)` and proves knowledge of an opening of
//! `C * R_i^{sign * bound}` as `R_i^{sign * m} * S^v`, reusing the main
//! proof's commitment randomizer for `m`. The prover refuses to build the
//! statement when the difference is negative. The decomposition argument over
//! the committed difference is a separate construction layered on top of this
//! linkage by deployments that need it.

use crate::arith;
use crate::common::*;
use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};

/// Which side of the bound the attribute must lie on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Relation {
    GreaterOrEqual,
    LessOrEqual,
}

impl Relation {
    /// `+1` or `-1`: the multiplier that makes the difference non-negative.
    fn sign(self) -> BigInt {
        match self {
            Relation::GreaterOrEqual => BigInt::from(1),
            Relation::LessOrEqual => BigInt::from(-1),
        }
    }
}

/// A bound on a single (hidden) attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    relation: Relation,
    bound: BigInt,
}

impl Statement {
    /// Require the attribute to be at least `bound`.
    pub fn greater_or_equal(bound: BigInt) -> Statement {
        Statement {
            relation: Relation::GreaterOrEqual,
            bound,
        }
    }

    /// Require the attribute to be at most `bound`.
    pub fn less_or_equal(bound: BigInt) -> Statement {
        Statement {
            relation: Relation::LessOrEqual,
            bound,
        }
    }

    /// Instantiate the statement against a concrete attribute index.
    pub fn proof_structure(&self, index: usize) -> Result<ProofStructure, Error> {
        Ok(ProofStructure {
            index,
            relation: self.relation,
            bound: self.bound.clone(),
        })
    }
}

/// A [`Statement`] bound to an attribute index, able to emit commitments and
/// responses tied to the witness and randomizer of the enclosing proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStructure {
    index: usize,
    relation: Relation,
    bound: BigInt,
}

/// Prover state of one range statement between the commitment and response
/// phases.
#[derive(Debug, Clone)]
pub struct ProofCommit {
    delta_commit: BigInt,
    v: BigInt,
    v_rand: BigInt,
}

/// A completed range statement proof.
///
/// The response for the attribute itself is deliberately absent: it is the
/// linked attribute response of the enclosing disclosure proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Commitment to the difference between attribute and bound.
    pub delta_commit: BigInt,
    /// Schnorr response for the commitment's blinding exponent.
    pub v_response: BigInt,
}

impl ProofStructure {
    /// The attribute index this structure constrains.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Run the commitment phase: commit to the difference and emit the
    /// commitment contributions `[C, t]`.
    ///
    /// `randomizer` must be the commitment randomizer used for this attribute
    /// in the enclosing proof. Fails with
    /// [`Error::RangeStatementUnsatisfied`] when the attribute does not
    /// actually satisfy the statement.
    pub fn commitments_from_secrets(
        &self,
        pk: &PublicKey,
        attribute: &BigInt,
        randomizer: &BigInt,
        rng: &mut impl Rng,
    ) -> Result<(Vec<BigInt>, ProofCommit), Error> {
        let params = pk.params();
        let n = pk.n();
        let base = pk.r_at(self.index).ok_or(Error::ParameterMismatch {
            capacity: pk.max_attributes(),
            got: self.index + 1,
        })?;

        let sign = self.relation.sign();
        let exponent = arith::attribute_exponent(attribute, params.lm);
        let delta = &sign * (exponent - &self.bound);
        if delta < BigInt::from(0) {
            return Err(Error::RangeStatementUnsatisfied(self.index));
        }

        let v = arith::random_bigint(rng, params.l_ra)?;
        let v_rand = arith::random_bigint(rng, params.l_ra + params.lstatzk + params.lh)?;

        let delta_commit = base.modpow(&delta, n) * pk.s().modpow(&v, n) % n;
        let t = arith::mod_pow(base, &(sign * randomizer), n)? * pk.s().modpow(&v_rand, n) % n;

        let contributions = vec![delta_commit.clone(), t];
        Ok((
            contributions,
            ProofCommit {
                delta_commit,
                v,
                v_rand,
            },
        ))
    }

    /// Run the response phase against the given challenge.
    pub fn build_proof(&self, commit: &ProofCommit, challenge: &BigInt) -> Proof {
        Proof {
            delta_commit: commit.delta_commit.clone(),
            v_response: &commit.v_rand + challenge * &commit.v,
        }
    }
}

impl Proof {
    /// Recompute the commitment contributions `[C, t]` from the proof, the
    /// challenge, and the linked attribute response of the enclosing
    /// disclosure proof.
    pub fn challenge_contributions(
        &self,
        pk: &PublicKey,
        structure: &ProofStructure,
        challenge: &BigInt,
        attribute_response: &BigInt,
    ) -> Result<Vec<BigInt>, Error> {
        let n = pk.n();
        let base = pk.r_at(structure.index).ok_or(Error::ParameterMismatch {
            capacity: pk.max_attributes(),
            got: structure.index + 1,
        })?;
        let sign = structure.relation.sign();

        let opened = &self.delta_commit * arith::mod_pow(base, &(&sign * &structure.bound), n)? % n;
        let t = arith::mod_pow(&opened, &-challenge, n)?
            * arith::mod_pow(base, &(sign * attribute_response), n)?
            % n
            * arith::mod_pow(pk.s(), &self.v_response, n)?
            % n;

        Ok(vec![self.delta_commit.clone(), t])
    }
}

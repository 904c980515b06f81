//! Membership proofs against an RSA accumulator, used to show that a
//! credential has not been revoked.
//!
//! A revocation witness is a pair `(u, e)` with `u^e = nu (mod n)`, where
//! `nu` is the current accumulator value and `e` is also embedded in the
//! credential as an attribute. The proof commits to `u` behind a blinded
//! `C_u = u * S^r` and shows knowledge of `(e, r, e*r, ...)` such that the
//! accumulator equation holds, without revealing either.
//!
//! The commitment randomizer for `e` (named `alpha`) is the linkage point
//! with the disclosure proof: the same randomizer backs the Schnorr response
//! for the revocation attribute, so a verifier re-derives the `alpha`
//! response from the main proof and the two proofs stand or fall together.
//!
//! The accumulator update pipeline (issuer-side deltas, witness refresh) is
//! not part of this crate; witnesses arrive here already updated.

use crate::arith;
use crate::common::*;
use crate::keys::PublicKey;
use crate::params::PARAMS_1024;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An accumulator state: the group element and its epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accumulator {
    /// The accumulated value `nu`.
    pub nu: BigInt,
    /// Monotonically non-decreasing epoch of this state.
    pub index: u64,
}

/// A membership witness `(u, e)` for the accumulator: `u^e = nu (mod n)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// The witness base.
    pub u: BigInt,
    /// The member: a prime that also appears as a credential attribute.
    pub e: BigInt,
    /// The accumulator state this witness is valid against.
    pub accumulator: Accumulator,
}

impl Witness {
    /// The accumulator epoch this witness was updated to.
    pub fn index(&self) -> u64 {
        self.accumulator.index
    }

    /// Check the witness equation `u^e = nu (mod n)`.
    pub fn verify(&self, pk: &PublicKey) -> bool {
        self.u.modpow(&self.e, pk.n()) == self.accumulator.nu
    }
}

/// Sample a fresh commitment randomizer for the member `e`.
///
/// Sized like a hidden-attribute randomizer, since the member doubles as a
/// credential attribute. Must be used for at most one proof; reuse lets a
/// verifier recover the witness.
pub fn new_proof_randomizer(rng: &mut impl Rng) -> Result<BigInt, Error> {
    arith::random_bigint(rng, PARAMS_1024.lm_commit)
}

/// The number of group elements a commitment phase emits.
pub(crate) const COMMITMENT_COUNT: usize = 5;

/// Prover state of a membership proof between the commitment and response
/// phases.
#[derive(Debug, Clone)]
pub struct ProofCommit {
    pk: PublicKey,
    accumulator: Accumulator,
    // Witness secrets and their products.
    e: BigInt,
    r: BigInt,
    r_prime: BigInt,
    beta: BigInt,
    epsilon: BigInt,
    // Commitment randomizers; alpha is shared with the disclosure proof.
    alpha_rand: BigInt,
    beta_rand: BigInt,
    zeta_rand: BigInt,
    eta_rand: BigInt,
    epsilon_rand: BigInt,
    // Public commitments.
    c_r: BigInt,
    c_u: BigInt,
}

/// A completed membership proof.
///
/// `responses` is keyed by greek-letter response names; the `alpha` entry is
/// removed when the proof rides along with a disclosure proof, in which case
/// `linked_attribute` names the attribute whose Schnorr response replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Commitment to the blinding exponent `r`.
    pub c_r: BigInt,
    /// Blinded witness base `u * S^r`.
    pub c_u: BigInt,
    /// Schnorr responses by name.
    pub responses: BTreeMap<String, BigInt>,
    /// The accumulator state the proof speaks about.
    pub accumulator: Accumulator,
    /// Attribute index whose disclosure-proof response doubles as `alpha`.
    pub linked_attribute: Option<usize>,
}

/// Run the commitment phase of a membership proof.
///
/// This is the expensive step (a batch of full-width exponentiations); the
/// credential layer caches its output so that an online prover can run it
/// ahead of time. Returns the emitted commitments
/// `[C_r, C_u, t_1, t_2, t_3]` together with the retained prover state.
pub fn new_proof_commit(
    pk: &PublicKey,
    witness: &Witness,
    randomizer: &BigInt,
    rng: &mut impl Rng,
) -> Result<(Vec<BigInt>, ProofCommit), Error> {
    let params = pk.params();
    let n = pk.n();

    let r = arith::random_bigint(rng, params.l_ra)?;
    let r_prime = arith::random_bigint(rng, params.l_ra)?;
    let beta = &witness.e * &r;
    let epsilon = &witness.e * &r_prime;

    let product_bits = params.lm + params.l_ra + params.lstatzk + params.lh;
    let exponent_bits = params.l_ra + params.lstatzk + params.lh;
    let beta_rand = arith::random_bigint(rng, product_bits)?;
    let epsilon_rand = arith::random_bigint(rng, product_bits)?;
    let zeta_rand = arith::random_bigint(rng, exponent_bits)?;
    let eta_rand = arith::random_bigint(rng, exponent_bits)?;

    let c_u = &witness.u * pk.s().modpow(&r, n) % n;
    let c_r = pk.s().modpow(&r, n) * pk.z().modpow(&r_prime, n) % n;

    let commit = ProofCommit {
        pk: pk.clone(),
        accumulator: witness.accumulator.clone(),
        e: witness.e.clone(),
        r,
        r_prime,
        beta,
        epsilon,
        alpha_rand: randomizer.clone(),
        beta_rand,
        zeta_rand,
        eta_rand,
        epsilon_rand,
        c_r,
        c_u,
    };

    let commitments = vec![
        commit.c_r.clone(),
        commit.c_u.clone(),
        commit.t_1()?,
        commit.t_2()?,
        commit.t_3()?,
    ];
    Ok((commitments, commit))
}

impl ProofCommit {
    fn t_1(&self) -> Result<BigInt, Error> {
        let n = self.pk.n();
        let lhs = self.c_u.modpow(&self.alpha_rand, n);
        let rhs = arith::mod_pow(self.pk.s(), &-&self.beta_rand, n)?;
        Ok(lhs * rhs % n)
    }

    fn t_2(&self) -> Result<BigInt, Error> {
        let n = self.pk.n();
        Ok(self.pk.s().modpow(&self.zeta_rand, n) * self.pk.z().modpow(&self.eta_rand, n) % n)
    }

    fn t_3(&self) -> Result<BigInt, Error> {
        let n = self.pk.n();
        let lhs = self.c_r.modpow(&self.alpha_rand, n);
        let mid = arith::mod_pow(self.pk.s(), &-&self.beta_rand, n)?;
        let rhs = arith::mod_pow(self.pk.z(), &-&self.epsilon_rand, n)?;
        Ok(lhs * mid % n * rhs % n)
    }

    /// Refresh the commitments for an updated witness.
    ///
    /// Only the blinded base and its relation commitment depend on `u`, so
    /// those two entries of `commitments` are rewritten in place; the blinding
    /// exponents and randomizers are kept.
    pub fn update(&mut self, commitments: &mut [BigInt], witness: &Witness) -> Result<(), Error> {
        let n = self.pk.n();
        self.c_u = &witness.u * self.pk.s().modpow(&self.r, n) % n;
        self.accumulator = witness.accumulator.clone();
        commitments[1] = self.c_u.clone();
        commitments[2] = self.t_1()?;
        Ok(())
    }

    /// Run the response phase against the given challenge.
    pub fn build_proof(&self, challenge: &BigInt) -> Proof {
        let mut responses = BTreeMap::new();
        let pairs: [(&str, &BigInt, &BigInt); 5] = [
            ("alpha", &self.alpha_rand, &self.e),
            ("beta", &self.beta_rand, &self.beta),
            ("zeta", &self.zeta_rand, &self.r),
            ("eta", &self.eta_rand, &self.r_prime),
            ("epsilon", &self.epsilon_rand, &self.epsilon),
        ];
        for (name, rand, secret) in pairs {
            let _ = responses.insert(name.to_string(), rand + challenge * secret);
        }
        Proof {
            c_r: self.c_r.clone(),
            c_u: self.c_u.clone(),
            responses,
            accumulator: self.accumulator.clone(),
            linked_attribute: None,
        }
    }
}

impl Proof {
    /// Recompute the commitment list `[C_r, C_u, t_1, t_2, t_3]` from the
    /// responses, the challenge, and the `alpha` response (which lives in the
    /// linked disclosure proof when `linked_attribute` is set).
    ///
    /// Equal output to the prover's commitment phase means the proof is
    /// consistent.
    pub fn challenge_contributions(
        &self,
        pk: &PublicKey,
        challenge: &BigInt,
        alpha: &BigInt,
    ) -> Result<Vec<BigInt>, Error> {
        let n = pk.n();
        let response = |name: &str| self.responses.get(name).cloned().unwrap_or_default();
        let beta = response("beta");
        let zeta = response("zeta");
        let eta = response("eta");
        let epsilon = response("epsilon");

        // Response values come off the wire; mod_pow tolerates their signs.
        let t_1 = arith::mod_pow(&self.c_u, alpha, n)?
            * arith::mod_pow(pk.s(), &-&beta, n)?
            % n
            * arith::mod_pow(&self.accumulator.nu, &-challenge, n)?
            % n;
        let t_2 = arith::mod_pow(pk.s(), &zeta, n)? * arith::mod_pow(pk.z(), &eta, n)? % n
            * arith::mod_pow(&self.c_r, &-challenge, n)?
            % n;
        let t_3 = arith::mod_pow(&self.c_r, alpha, n)?
            * arith::mod_pow(pk.s(), &-&beta, n)?
            % n
            * arith::mod_pow(pk.z(), &-&epsilon, n)?
            % n;

        Ok(vec![
            self.c_r.clone(),
            self.c_u.clone(),
            t_1,
            t_2,
            t_3,
        ])
    }
}

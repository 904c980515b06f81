//! Randomizable multi-message Camenisch-Lysyanskaya signatures over a
//! strong-RSA group.
//!
//! The scheme is the one defined in ["A Signature Scheme with Efficient
//! Protocols"](https://cs.brown.edu/people/alysyans/papers/camlys02b.pdf)
//! (SCN 2002), as instantiated in the IBM Identity Mixer system: a signature
//! on messages `m_0 .. m_k` is a triple `(A, e, v)` with
//! `A^e * R_0^{m_0} * ... * R_k^{m_k} * S^v = Z (mod n)`,
//! `e` prime from a prescribed interval.
//!
//! The triple can be re-randomized ([`CLSignature::randomize`]) into an
//! unlinkable but equally valid signature, which is step one of every
//! disclosure proof.

use crate::arith;
use crate::common::*;
use crate::keys::{PrivateKey, PublicKey};
use num_traits::One;
use serde::{Deserialize, Serialize};

/// Compute the representation `R_0^{exps[0]} * ... * R_k^{exps[k]} (mod n)`
/// of the given exponents in terms of the `R` bases of the public key.
/// Exponents longer than the maximum message length are hashed first.
pub fn represent_to_public_key(pk: &PublicKey, exponents: &[BigInt]) -> BigInt {
    arith::represent_to_bases(pk.r(), exponents, pk.n(), pk.params().lm)
}

/// A Camenisch-Lysyanskaya signature `(A, e, v)` on a block of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CLSignature {
    pub(crate) a: BigInt,
    pub(crate) e: BigInt,
    /// Over the integers; becomes negative after randomization when `e*r > v`.
    pub(crate) v: BigInt,
    /// Contribution `R_0^{secret share}` of a keyshare server, when part of
    /// the user's secret lives elsewhere. Multiplied into the verification
    /// equation when present.
    pub(crate) keyshare_p: Option<BigInt>,
}

impl CLSignature {
    /// Assemble a signature from its parts.
    pub fn new(a: BigInt, e: BigInt, v: BigInt, keyshare_p: Option<BigInt>) -> CLSignature {
        CLSignature {
            a,
            e,
            v,
            keyshare_p,
        }
    }

    /// The value `A`.
    pub fn a(&self) -> &BigInt {
        &self.a
    }

    /// The prime `e`.
    pub fn e(&self) -> &BigInt {
        &self.e
    }

    /// The blinding value `v`.
    pub fn v(&self) -> &BigInt {
        &self.v
    }

    /// Check the signature against a public key and message block.
    ///
    /// Valid iff the CL equation holds, `e` lies in
    /// `[2^(Le-1), 2^(Le-1) + 2^(LePrime-1)]`, and `e` passes an 80-round
    /// Miller-Rabin test.
    pub fn verify(&self, pk: &PublicKey, messages: &[BigInt]) -> bool {
        let params = pk.params();

        let start = BigInt::one() << (params.le - 1);
        let end = &start + (BigInt::one() << (params.le_prime - 1));
        if self.e < start || self.e > end {
            return false;
        }
        if !arith::probably_prime(&self.e, 80) {
            return false;
        }

        let a_e = self.a.modpow(&self.e, pk.n());
        let mut representation = represent_to_public_key(pk, messages);
        if let Some(keyshare_p) = &self.keyshare_p {
            representation = representation * keyshare_p % pk.n();
        }
        // v may be negative; mod_pow inverts the base for us.
        let s_v = match arith::mod_pow(pk.s(), &self.v, pk.n()) {
            Ok(s_v) => s_v,
            Err(_) => return false,
        };

        let q = a_e * representation % pk.n() * s_v % pk.n();
        &q == pk.z()
    }

    /// Produce an unlinkable copy of the signature.
    ///
    /// `A' = A * S^r` for a uniform `r` of `LRA = Ln + Lstatzk` bits, and
    /// `v' = v - e*r` over the integers, so `(A', e, v')` satisfies the same
    /// CL equation while `A'` is statistically independent of `A` within the
    /// subgroup generated by `S`.
    pub fn randomize(&self, pk: &PublicKey, rng: &mut impl Rng) -> Result<CLSignature, Error> {
        let r = arith::random_bigint(rng, pk.params().l_ra)?;
        let a = &self.a * pk.s().modpow(&r, pk.n()) % pk.n();
        let v = &self.v - &self.e * r;
        Ok(CLSignature {
            a,
            e: self.e.clone(),
            v,
            keyshare_p: self.keyshare_p.clone(),
        })
    }
}

/// Sign a message block with the Camenisch-Lysyanskaya scheme.
///
/// `v` is a uniform `Lv`-bit value with its top bit forced, `e` a fresh prime
/// from the prescribed interval, and `A = (Z / (S^v * prod R_i^{m_i}))^{1/e}`
/// with the inversion of `e` done modulo the group order `p'q'`.
pub fn sign_message_block(
    sk: &PrivateKey,
    pk: &PublicKey,
    messages: &[BigInt],
    rng: &mut impl Rng,
) -> Result<CLSignature, Error> {
    if messages.len() > pk.max_attributes() {
        return Err(Error::ParameterMismatch {
            capacity: pk.max_attributes(),
            got: messages.len(),
        });
    }
    let params = pk.params();

    let v = (BigInt::one() << (params.lv - 1)) + arith::random_bigint(rng, params.lv - 1)?;

    let representation = represent_to_public_key(pk, messages);
    let numerator = pk.s().modpow(&v, pk.n()) * representation % pk.n();
    let q = pk.z() * arith::mod_inverse(&numerator, pk.n())? % pk.n();

    let e = arith::random_prime_in_range(rng, params.le - 1, params.le_prime - 1)?;
    // TODO: the inversion of e is not constant-time; acceptable for the
    // prover-side test signer, revisit before using this path in an issuer.
    let d = arith::mod_inverse(&e, &sk.order())?;
    let a = q.modpow(&d, pk.n());

    Ok(CLSignature {
        a,
        e,
        v,
        keyshare_p: None,
    })
}

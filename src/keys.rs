//! Issuer key material for the CL signature scheme.
//!
//! An issuer key is a strong-RSA setup: `n = p*q` for safe primes `p`, `q`,
//! a quadratic residue `S`, and powers `Z`, `R[0..k]` of `S` whose discrete
//! logarithms are known only to the issuer. Interop note: the binary
//! representation of `n`, `Z`, `S` and `R[i]` is big-endian, unsigned and
//! minimal-length, which is what [`num_bigint::BigInt::to_bytes_be`] yields.

use crate::arith;
use crate::common::*;
use crate::params::SystemParameters;
use num_traits::One;
use serde::{Deserialize, Serialize};

/// An issuer's public key.
///
/// Immutable after construction; all fields are exposed through accessors
/// only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    n: BigInt,
    z: BigInt,
    s: BigInt,
    r: Vec<BigInt>,
    params: SystemParameters,
}

impl PublicKey {
    /// Assemble a public key from its group elements.
    ///
    /// The caller is responsible for the elements being valid, i.e. `n > 0`
    /// and `S`, `Z`, `R[i]` members of `Z*_n`.
    pub fn new(
        n: BigInt,
        z: BigInt,
        s: BigInt,
        r: Vec<BigInt>,
        params: SystemParameters,
    ) -> PublicKey {
        PublicKey { n, z, s, r, params }
    }

    /// The modulus `n`.
    pub fn n(&self) -> &BigInt {
        &self.n
    }

    /// The generator `Z`.
    pub fn z(&self) -> &BigInt {
        &self.z
    }

    /// The generator `S`.
    pub fn s(&self) -> &BigInt {
        &self.s
    }

    /// The attribute bases `R[0..k]`.
    pub fn r(&self) -> &[BigInt] {
        &self.r
    }

    /// The base for attribute `index`, if the key is large enough.
    pub fn r_at(&self, index: usize) -> Option<&BigInt> {
        self.r.get(index)
    }

    /// The bit-length parameter set this key was generated for.
    pub fn params(&self) -> &SystemParameters {
        &self.params
    }

    /// The maximum number of attributes this key can sign.
    pub fn max_attributes(&self) -> usize {
        self.r.len()
    }
}

/// An issuer's private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey {
    p: BigInt,
    q: BigInt,
    p_prime: BigInt,
    q_prime: BigInt,
}

impl PrivateKey {
    /// Build a private key from two safe primes.
    pub fn new(p: BigInt, q: BigInt) -> PrivateKey {
        let p_prime = (&p - BigInt::one()) >> 1;
        let q_prime = (&q - BigInt::one()) >> 1;
        PrivateKey {
            p,
            q,
            p_prime,
            q_prime,
        }
    }

    /// The order `p'q'` of the quadratic-residue subgroup.
    pub(crate) fn order(&self) -> BigInt {
        &self.p_prime * &self.q_prime
    }
}

/// A safe prime of the requested number of bits.
fn random_safe_prime(rng: &mut impl Rng, bits: u32) -> Result<BigInt, Error> {
    for _ in 0..100_000u32 {
        let p = arith::random_prime(rng, bits)?;
        let p_half = (&p - BigInt::one()) >> 1;
        if arith::probably_prime(&p_half, 20) {
            return Ok(p);
        }
    }
    Err(Error::PrimeGenerationFailure)
}

/// An exponent in `(2, n)`, used to derive `Z` and `R[i]` from `S`.
fn random_exponent(rng: &mut impl Rng, bits: u32, n: &BigInt) -> Result<BigInt, Error> {
    loop {
        let x = arith::random_bigint(rng, bits)?;
        if x > BigInt::from(2) && &x < n {
            return Ok(x);
        }
    }
}

/// Generate an issuer key pair for the given parameter set, able to sign
/// `num_attributes` attributes.
pub fn generate_key_pair(
    rng: &mut impl Rng,
    params: SystemParameters,
    num_attributes: usize,
) -> Result<(PrivateKey, PublicKey), Error> {
    let prime_bits = params.ln / 2;

    let p = random_safe_prime(rng, prime_bits)?;
    let q = random_safe_prime(rng, prime_bits)?;
    let sk = PrivateKey::new(p, q);
    let n = &sk.p * &sk.q;

    // S must be a quadratic residue mod n; squaring a unit gives a uniform one.
    let s = loop {
        let candidate = arith::random_bigint(rng, params.ln)?;
        if candidate > BigInt::one() && candidate < n {
            break candidate.modpow(&BigInt::from(2), &n);
        }
    };

    let x = random_exponent(rng, prime_bits, &n)?;
    let z = s.modpow(&x, &n);

    let mut r = Vec::with_capacity(num_attributes);
    for _ in 0..num_attributes {
        let x = random_exponent(rng, prime_bits, &n)?;
        r.push(s.modpow(&x, &n));
    }

    Ok((sk, PublicKey::new(n, z, s, r, params)))
}

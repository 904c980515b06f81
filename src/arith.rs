//! Arbitrary-precision modular arithmetic over a composite modulus.
//!
//! Everything here operates on signed [`BigInt`]s: the protocol produces
//! negative exponents (a re-randomized signature carries `v' = v - e*r`) and
//! negative challenge multiples, so [`mod_pow`] accepts a negative exponent by
//! first inverting the base.

use crate::common::*;
use num_bigint::Sign;
use num_integer::{ExtendedGcd, Integer};
use num_traits::{One, Signed, Zero};
use sha2::{Digest, Sha256};

/// Primes below 300, used for cheap trial division before Miller-Rabin.
const SMALL_PRIMES: [u32; 62] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293,
];

/// Sample a uniform integer in `[0, 2^bits)`.
///
/// Fails with [`Error::RandomnessFailure`] if the system randomness source
/// does.
pub(crate) fn random_bigint(rng: &mut impl Rng, bits: u32) -> Result<BigInt, Error> {
    if bits == 0 {
        return Ok(BigInt::zero());
    }
    let mut bytes = vec![0u8; (bits as usize + 7) / 8];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|_| Error::RandomnessFailure)?;
    let partial = bits % 8;
    if partial != 0 {
        bytes[0] &= (1u8 << partial) - 1;
    }
    Ok(BigInt::from_bytes_be(Sign::Plus, &bytes))
}

/// Compute `base^exponent mod modulus`, accepting a negative exponent.
///
/// A negative exponent requires the base to be invertible modulo the modulus;
/// if it is not, [`Error::ModularInverseFailure`] is returned.
pub(crate) fn mod_pow(base: &BigInt, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt, Error> {
    if exponent.is_negative() {
        let inverse = mod_inverse(base, modulus)?;
        Ok(inverse.modpow(&-exponent, modulus))
    } else {
        Ok(base.modpow(exponent, modulus))
    }
}

/// Compute the inverse of `value` modulo `modulus`, in `[0, modulus)`.
pub(crate) fn mod_inverse(value: &BigInt, modulus: &BigInt) -> Result<BigInt, Error> {
    let ExtendedGcd { gcd, x, .. } = value.extended_gcd(modulus);
    if !gcd.is_one() {
        return Err(Error::ModularInverseFailure);
    }
    Ok(x.mod_floor(modulus))
}

/// Hash a byte string with SHA-256 and interpret the digest as an unsigned
/// big-endian integer.
pub(crate) fn int_hash_sha256(data: &[u8]) -> BigInt {
    let digest = Sha256::digest(data);
    BigInt::from_bytes_be(Sign::Plus, &digest)
}

/// The exponent actually used for an attribute: the attribute itself, or its
/// SHA-256 image when it exceeds the maximum message length.
pub(crate) fn attribute_exponent(attribute: &BigInt, max_message_bits: u32) -> BigInt {
    if attribute.bits() > u64::from(max_message_bits) {
        int_hash_sha256(&attribute.to_bytes_be().1)
    } else {
        attribute.clone()
    }
}

/// Compute `bases[0]^{exps[0]} * ... * bases[k]^{exps[k]} mod modulus`, with
/// oversized exponents replaced by their hash image.
pub(crate) fn represent_to_bases(
    bases: &[BigInt],
    exponents: &[BigInt],
    modulus: &BigInt,
    max_message_bits: u32,
) -> BigInt {
    let mut result = BigInt::one();
    for (base, exponent) in bases.iter().zip(exponents) {
        let exponent = attribute_exponent(exponent, max_message_bits);
        result = result * base.modpow(&exponent, modulus) % modulus;
    }
    result
}

/// Miller-Rabin primality test with `rounds` witness rounds.
///
/// The witnesses are base 2 followed by bases derived deterministically from
/// the candidate through a SHA-256 counter chain, so the test is a pure
/// function of its inputs.
pub(crate) fn probably_prime(candidate: &BigInt, rounds: u32) -> bool {
    let two = BigInt::from(2);
    if candidate < &two {
        return false;
    }
    for p in SMALL_PRIMES {
        let p = BigInt::from(p);
        if candidate.is_multiple_of(&p) {
            return *candidate == p;
        }
    }

    // candidate - 1 = d * 2^trailing, d odd
    let minus_one = candidate - BigInt::one();
    let trailing = minus_one.trailing_zeros().unwrap_or(0);
    let d = &minus_one >> trailing;

    let base_range = candidate - BigInt::from(4);
    let candidate_bytes = candidate.to_bytes_be().1;
    for round in 0..rounds {
        let base = if round == 0 {
            two.clone()
        } else {
            let mut hasher = Sha256::new();
            hasher.update(round.to_be_bytes());
            hasher.update(&candidate_bytes);
            let drawn = BigInt::from_bytes_be(Sign::Plus, &hasher.finalize());
            drawn.mod_floor(&base_range) + &two
        };

        let mut x = base.modpow(&d, candidate);
        if x.is_one() || x == minus_one {
            continue;
        }
        let mut witnessed_composite = true;
        for _ in 1..trailing {
            x = x.modpow(&two, candidate);
            if x == minus_one {
                witnessed_composite = false;
                break;
            }
        }
        if witnessed_composite {
            return false;
        }
    }
    true
}

/// Sample a probable prime in `[2^start_bits, 2^start_bits + 2^interval_bits)`.
pub(crate) fn random_prime_in_range(
    rng: &mut impl Rng,
    start_bits: u32,
    interval_bits: u32,
) -> Result<BigInt, Error> {
    let lower = BigInt::one() << start_bits;
    // Candidate density leaves this budget orders of magnitude above the
    // expected number of draws.
    for _ in 0..100_000u32 {
        let candidate = &lower + (random_bigint(rng, interval_bits)? | BigInt::one());
        if probably_prime(&candidate, 40) {
            return Ok(candidate);
        }
    }
    Err(Error::PrimeGenerationFailure)
}

/// Sample a probable prime of exactly `bits` bits.
pub(crate) fn random_prime(rng: &mut impl Rng, bits: u32) -> Result<BigInt, Error> {
    let lower = BigInt::one() << (bits - 1);
    for _ in 0..100_000u32 {
        let candidate = &lower + (random_bigint(rng, bits - 1)? | BigInt::one());
        if probably_prime(&candidate, 40) {
            return Ok(candidate);
        }
    }
    Err(Error::PrimeGenerationFailure)
}

//! Functionality for building Fiat-Shamir challenges.
//!
//! A challenge is the SHA-256 hash of an ordered transcript: the session
//! context, the commitment contributions of every participating proof builder
//! in order, and the verifier nonce. Commitment ordering is part of the hash
//! input and therefore consensus-critical; prover and verifier must produce
//! bit-identical transcripts.
//!
//! ## Encoding
//!
//! The hash input is a domain tag byte (`0x01` for signature sessions, `0x00`
//! otherwise), then each element as its 8-byte big-endian byte length followed
//! by its minimal big-endian magnitude, and finally the element count as an
//! 8-byte big-endian integer.

use crate::arith;
use crate::common::*;
use crate::proofs::disclosure::{DisclosureProofBuilder, ProofD};
use num_bigint::Sign;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A challenge for use in a Schnorr-style proof, in `[0, 2^Lh)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge(pub(crate) BigInt);

impl Challenge {
    /// Retrieve the challenge value.
    pub fn as_int(&self) -> &BigInt {
        &self.0
    }
}

/// Holds state used when building a [`Challenge`], as in a non-interactive
/// Schnorr proof.
#[derive(Debug, Clone)]
pub struct ChallengeBuilder {
    hasher: Sha256,
    elements: u64,
}

impl ChallengeBuilder {
    /// Initialize an empty transcript for a disclosure session.
    pub fn new() -> Self {
        Self::with_domain_tag(0x00)
    }

    /// Initialize an empty transcript for an attribute-based signature
    /// session.
    pub fn new_signature_session() -> Self {
        Self::with_domain_tag(0x01)
    }

    fn with_domain_tag(tag: u8) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([tag]);
        Self {
            hasher,
            elements: 0,
        }
    }

    /// Incorporate one non-negative integer into the transcript.
    pub fn digest_int(&mut self, value: &BigInt) {
        debug_assert!(value.sign() != Sign::Minus);
        let magnitude = value.to_bytes_be().1;
        self.hasher.update((magnitude.len() as u64).to_be_bytes());
        self.hasher.update(&magnitude);
        self.elements += 1;
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::digest_int`].
    pub fn with_int(mut self, value: &BigInt) -> Self {
        self.digest_int(value);
        self
    }

    /// Incorporate a list of non-negative integers into the transcript.
    pub fn digest_ints<'a>(&mut self, values: impl IntoIterator<Item = &'a BigInt>) {
        for value in values {
            self.digest_int(value);
        }
    }

    /// Consume the builder and derive the [`Challenge`].
    ///
    /// The digest is 32 bytes, so the result lies in `[0, 2^Lh)` for every
    /// defined parameter set by construction.
    pub fn finish(mut self) -> Challenge {
        self.hasher.update(self.elements.to_be_bytes());
        Challenge(BigInt::from_bytes_be(
            Sign::Plus,
            &self.hasher.finalize(),
        ))
    }
}

impl Default for ChallengeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered list of proof builders contributing to one challenge.
///
/// All builders share the `"secretkey"` randomizer, so the proofs demonstrate
/// that their credentials carry the same user secret.
#[derive(Debug)]
pub struct ProofBuilderList(Vec<DisclosureProofBuilder>);

impl ProofBuilderList {
    /// Wrap an ordered list of builders.
    pub fn new(builders: Vec<DisclosureProofBuilder>) -> Self {
        ProofBuilderList(builders)
    }

    /// The number of builders in the list.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Run the commitment phase of every builder and hash the combined
    /// transcript `[context, contributions.., nonce]` into a challenge.
    ///
    /// The shared secret-key randomizer is sampled here. The user secret is a
    /// 256-bit value regardless of which keys it is used under (see
    /// [`generate_secret_attribute`]), so the randomizer is sized for that
    /// attribute length.
    ///
    /// [`generate_secret_attribute`]: crate::credential::generate_secret_attribute
    pub fn challenge(
        &mut self,
        context: &BigInt,
        nonce: &BigInt,
        signature_session: bool,
        rng: &mut impl Rng,
    ) -> Result<Challenge, Error> {
        let sk_randomizer =
            arith::random_bigint(rng, crate::params::PARAMS_1024.lm_commit)?;
        let mut randomizers = HashMap::new();
        let _ = randomizers.insert("secretkey".to_string(), sk_randomizer);

        let mut transcript = if signature_session {
            ChallengeBuilder::new_signature_session()
        } else {
            ChallengeBuilder::new()
        };
        transcript.digest_int(context);
        for builder in &mut self.0 {
            let contributions = builder.commit(&randomizers, rng)?;
            transcript.digest_ints(&contributions);
        }
        transcript.digest_int(nonce);
        Ok(transcript.finish())
    }

    /// Run the response phase of every builder against the shared challenge.
    pub fn create_proofs(&self, challenge: &Challenge) -> Result<Vec<ProofD>, Error> {
        self.0
            .iter()
            .map(|builder| builder.create_proof(challenge))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transcripts_are_order_sensitive() {
        let one = BigInt::from(1);
        let two = BigInt::from(2);

        let ab = ChallengeBuilder::new().with_int(&one).with_int(&two).finish();
        let ba = ChallengeBuilder::new().with_int(&two).with_int(&one).finish();
        assert_ne!(ab, ba);
    }

    #[test]
    fn transcripts_are_deterministic() {
        let value = BigInt::from(123456789);
        let first = ChallengeBuilder::new().with_int(&value).finish();
        let second = ChallengeBuilder::new().with_int(&value).finish();
        assert_eq!(first, second);
    }

    #[test]
    fn element_boundaries_are_unambiguous() {
        // [0x01, 0x02] as one element vs. two elements must hash apart.
        let joined = BigInt::from(0x0102);
        let first = BigInt::from(0x01);
        let second = BigInt::from(0x02);

        let one_element = ChallengeBuilder::new().with_int(&joined).finish();
        let two_elements = ChallengeBuilder::new()
            .with_int(&first)
            .with_int(&second)
            .finish();
        assert_ne!(one_element, two_elements);
    }

    #[test]
    fn signature_sessions_are_domain_separated() {
        let value = BigInt::from(7);
        let plain = ChallengeBuilder::new().with_int(&value).finish();
        let signature = ChallengeBuilder::new_signature_session()
            .with_int(&value)
            .finish();
        assert_ne!(plain, signature);
    }
}

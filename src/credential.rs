//! Credentials: a CL signature over attributes, plus the per-credential
//! cache of prepared non-revocation provers.

use crate::arith;
use crate::camenisch_lysyanskaya::CLSignature;
use crate::common::*;
use crate::keys::PublicKey;
use crate::params::PARAMS_1024;
use crate::proofs::{DisclosureProofBuilder, NonRevocationProofBuilder, ProofBuilderList, ProofD};
use crate::rangeproof;
use crate::revocation::{self, Witness};
use log::trace;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An Idemix credential: a CL signature over an ordered attribute list.
///
/// Attribute 0 is by convention the user secret. A credential that supports
/// revocation additionally carries a [`Witness`], and embeds the witness
/// member among its attributes.
///
/// The only mutable state is the single-slot cache of prepared
/// non-revocation proof builders; everything else is immutable, so a
/// credential can serve any number of concurrent proof constructions.
#[derive(Debug)]
pub struct Credential {
    pk: PublicKey,
    signature: CLSignature,
    attributes: Vec<BigInt>,
    witness: Option<Witness>,
    /// Holds at most one prepared builder. Discipline: take-or-skip on
    /// consume, fill-or-discard on prepare; a taken builder is never put
    /// back, so its randomizer is used at most once.
    nonrev_cache: Mutex<Option<NonRevocationProofBuilder>>,
}

impl Credential {
    /// Assemble a credential.
    ///
    /// Fails when the key cannot cover the attribute list.
    pub fn new(
        pk: PublicKey,
        signature: CLSignature,
        attributes: Vec<BigInt>,
        witness: Option<Witness>,
    ) -> Result<Credential, Error> {
        if attributes.len() > pk.max_attributes() {
            return Err(Error::ParameterMismatch {
                capacity: pk.max_attributes(),
                got: attributes.len(),
            });
        }
        Ok(Credential {
            pk,
            signature,
            attributes,
            witness,
            nonrev_cache: Mutex::new(None),
        })
    }

    /// The issuer public key the credential was issued under.
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// The signature over the attributes.
    pub fn signature(&self) -> &CLSignature {
        &self.signature
    }

    /// The ordered attribute list.
    pub fn attributes(&self) -> &[BigInt] {
        &self.attributes
    }

    /// The revocation witness, if the credential supports revocation.
    pub fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }

    /// Produce a complete disclosure proof for the given disclosed indices,
    /// running a single-builder session under the given context and nonce.
    pub fn create_disclosure_proof(
        &self,
        disclosed: &[usize],
        range_statements: Option<&BTreeMap<usize, Vec<rangeproof::Statement>>>,
        nonrev: bool,
        context: &BigInt,
        nonce: &BigInt,
        rng: &mut impl Rng,
    ) -> Result<ProofD, Error> {
        let builder =
            self.create_disclosure_proof_builder(disclosed, range_statements, nonrev, rng)?;
        let mut list = ProofBuilderList::new(vec![builder]);
        let challenge = list.challenge(context, nonce, false, rng)?;
        let mut proofs = list.create_proofs(&challenge)?;
        Ok(proofs.pop().expect("one builder yields one proof"))
    }

    /// Produce a [`DisclosureProofBuilder`], for sessions where the proof is
    /// linked to other proofs through a shared challenge.
    pub fn create_disclosure_proof_builder(
        &self,
        disclosed: &[usize],
        range_statements: Option<&BTreeMap<usize, Vec<rangeproof::Statement>>>,
        nonrev: bool,
        rng: &mut impl Rng,
    ) -> Result<DisclosureProofBuilder, Error> {
        let nonrev_state = if nonrev {
            if self.witness.is_none() {
                return Err(Error::MissingWitness);
            }
            let index = self.nonrev_index()?;
            let builder = self.nonrev_consume_builder(rng)?;
            Some((index, builder))
        } else {
            None
        };

        DisclosureProofBuilder::new(
            self.pk.clone(),
            &self.signature,
            self.attributes.clone(),
            disclosed,
            range_statements,
            nonrev_state,
            rng,
        )
    }

    /// The index of the attribute holding the revocation witness member.
    pub fn nonrev_index(&self) -> Result<usize, Error> {
        let witness = self.witness.as_ref().ok_or(Error::MissingWitness)?;
        self.attributes
            .iter()
            .position(|attribute| attribute == &witness.e)
            .ok_or(Error::RevocationAttributeMissing)
    }

    /// Ensure the non-revocation builder cache holds a prepared builder:
    /// create one if the slot is empty, otherwise refresh the cached one to
    /// the credential's current witness.
    ///
    /// Intended to run ahead of time (e.g. in the background after a witness
    /// update), so the next disclosure proof skips the expensive commitment
    /// phase. If a concurrent preparation filled the slot in the meantime,
    /// this one's result is discarded; losing a prepared builder is
    /// acceptable, reusing one is not.
    ///
    /// A no-op for credentials without a witness.
    pub fn nonrev_prepare_cache(&self, rng: &mut impl Rng) -> Result<(), Error> {
        let witness = match &self.witness {
            Some(witness) => witness,
            None => return Ok(()),
        };

        // Take with a short critical section; the expensive work below runs
        // with the slot released so concurrent consumers are never held up.
        let cached = self.lock_cache().take();
        let builder = match cached {
            Some(mut builder) => {
                trace!("updating existing nonrevocation commitment");
                builder.update_commit(witness)?;
                builder
            }
            None => {
                trace!("instantiating new nonrevocation commitment");
                self.nonrev_build_proof_builder(rng)?
            }
        };

        let mut slot = self.lock_cache();
        if slot.is_none() {
            *slot = Some(builder);
        }
        Ok(())
    }

    /// Build a fresh, committed non-revocation proof builder for the current
    /// witness, with a fresh randomizer.
    pub fn nonrev_build_proof_builder(
        &self,
        rng: &mut impl Rng,
    ) -> Result<NonRevocationProofBuilder, Error> {
        let witness = self.witness.as_ref().ok_or(Error::MissingWitness)?;
        let randomizer = revocation::new_proof_randomizer(rng)?;
        let mut builder =
            NonRevocationProofBuilder::new(self.pk.clone(), witness.clone(), randomizer);
        let _ = builder.commit(rng)?;
        Ok(builder)
    }

    /// Take the cached builder if there is one (bringing it up to date), or
    /// build one synchronously. Never blocks on the preparation of another
    /// session.
    ///
    /// The taken builder is never returned to the slot: its randomizer backs
    /// exactly one proof. Reuse in a second session would let a verifier
    /// recover the revocation witness from the two proofs.
    fn nonrev_consume_builder(
        &self,
        rng: &mut impl Rng,
    ) -> Result<NonRevocationProofBuilder, Error> {
        let witness = self.witness.as_ref().ok_or(Error::MissingWitness)?;
        let cached = self.lock_cache().take();
        match cached {
            Some(mut builder) => {
                builder.update_commit(witness)?;
                Ok(builder)
            }
            None => self.nonrev_build_proof_builder(rng),
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<NonRevocationProofBuilder>> {
        // A poisoning panic cannot leave the slot semantically broken; the
        // worst a poisoned slot can hold is a stale prepared builder.
        self.nonrev_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Generate a user secret for the first attribute slot: a uniform value of
/// the default attribute length, short enough to use under every defined key
/// length.
pub fn generate_secret_attribute(rng: &mut impl Rng) -> Result<BigInt, Error> {
    arith::random_bigint(rng, PARAMS_1024.lm)
}

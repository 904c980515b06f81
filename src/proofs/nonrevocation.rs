//! The cached prover side of a non-revocation proof.
//!
//! A [`NonRevocationProofBuilder`] is a single-use commit/response object
//! bound to one witness and one randomizer. The commitment phase is the
//! expensive part, so credentials keep one prepared builder around (see the
//! credential's cache) and refresh it with [`UpdateCommit`] when the
//! accumulator moves, instead of recomputing from scratch.
//!
//! Single-use is a hard requirement, not a performance note: answering two
//! different challenges with one randomizer lets a verifier solve for the
//! witness member `e`.
//!
//! [`UpdateCommit`]: NonRevocationProofBuilder::update_commit

use crate::common::*;
use crate::keys::PublicKey;
use crate::revocation::{self, Witness};

/// Prover state for one non-revocation proof: a witness, a randomizer, and
/// (once committed) the cached commitment phase output.
#[derive(Debug)]
pub struct NonRevocationProofBuilder {
    pk: PublicKey,
    witness: Witness,
    commit: Option<revocation::ProofCommit>,
    commitments: Vec<BigInt>,
    randomizer: BigInt,
    index: u64,
}

impl NonRevocationProofBuilder {
    /// Bind a builder to a witness and a fresh randomizer.
    pub fn new(pk: PublicKey, witness: Witness, randomizer: BigInt) -> NonRevocationProofBuilder {
        let index = witness.index();
        NonRevocationProofBuilder {
            pk,
            witness,
            commit: None,
            commitments: Vec::new(),
            randomizer,
            index,
        }
    }

    /// Run the commitment phase, or return the cached commitments if it has
    /// already run.
    pub fn commit(&mut self, rng: &mut impl Rng) -> Result<Vec<BigInt>, Error> {
        if self.commitments.is_empty() {
            let (commitments, commit) =
                revocation::new_proof_commit(&self.pk, &self.witness, &self.randomizer, rng)?;
            self.commitments = commitments;
            self.commit = Some(commit);
        }
        Ok(self.commitments.clone())
    }

    /// The cached commitment list.
    pub(crate) fn commitments(&self) -> Result<&[BigInt], Error> {
        if self.commitments.is_empty() {
            return Err(Error::UninitializedBuilder);
        }
        Ok(&self.commitments)
    }

    /// Refresh the commitments for a witness updated to a newer accumulator.
    ///
    /// A no-op when the witness is not newer than what the builder already
    /// holds. Fails with [`Error::UninitializedBuilder`] before the first
    /// [`commit`](NonRevocationProofBuilder::commit).
    pub fn update_commit(&mut self, witness: &Witness) -> Result<(), Error> {
        if self.commitments.len() < revocation::COMMITMENT_COUNT {
            return Err(Error::UninitializedBuilder);
        }
        let commit = self.commit.as_mut().ok_or(Error::UninitializedBuilder)?;
        if self.index >= witness.index() {
            return Ok(());
        }
        commit.update(&mut self.commitments, witness)?;
        self.witness = witness.clone();
        self.index = witness.index();
        Ok(())
    }

    /// Run the response phase against the given challenge.
    ///
    /// Callers that link the result into a disclosure proof remove the
    /// `alpha` response afterwards; it is re-derived from the linked
    /// attribute's response during verification.
    pub fn create_proof(&self, challenge: &BigInt) -> Result<revocation::Proof, Error> {
        let commit = self.commit.as_ref().ok_or(Error::UninitializedBuilder)?;
        Ok(commit.build_proof(challenge))
    }

    /// The accumulator epoch the commitments are valid against.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The commitment randomizer for the witness member, shared with the
    /// enclosing disclosure proof.
    pub(crate) fn randomizer(&self) -> &BigInt {
        &self.randomizer
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arith;
    use crate::revocation::test::{fabricated_witness, witness_for_member};
    use crate::test::{rng, tiny_key_pair};

    #[test]
    fn update_before_commit_is_rejected() {
        let mut rng = rng();
        let (_, pk) = tiny_key_pair(&mut rng, 2);
        let witness = fabricated_witness(&pk, &mut rng, 1);
        let randomizer = revocation::new_proof_randomizer(&mut rng).unwrap();

        let mut builder = NonRevocationProofBuilder::new(pk, witness.clone(), randomizer);
        assert_eq!(
            builder.update_commit(&witness),
            Err(Error::UninitializedBuilder)
        );
    }

    #[test]
    fn commit_is_cached() {
        let mut rng = rng();
        let (_, pk) = tiny_key_pair(&mut rng, 2);
        let witness = fabricated_witness(&pk, &mut rng, 1);
        let randomizer = revocation::new_proof_randomizer(&mut rng).unwrap();

        let mut builder = NonRevocationProofBuilder::new(pk, witness, randomizer);
        let first = builder.commit(&mut rng).unwrap();
        let second = builder.commit(&mut rng).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn update_with_an_older_or_equal_witness_is_a_noop() {
        let mut rng = rng();
        let (_, pk) = tiny_key_pair(&mut rng, 2);
        let witness = fabricated_witness(&pk, &mut rng, 5);
        let randomizer = revocation::new_proof_randomizer(&mut rng).unwrap();

        let mut builder = NonRevocationProofBuilder::new(pk.clone(), witness.clone(), randomizer);
        let committed = builder.commit(&mut rng).unwrap();

        let equal = witness_for_member(&pk, &mut rng, &witness.e, 5);
        builder.update_commit(&equal).unwrap();
        assert_eq!(builder.commitments().unwrap(), &committed[..]);
        assert_eq!(builder.index(), 5);

        let older = witness_for_member(&pk, &mut rng, &witness.e, 3);
        builder.update_commit(&older).unwrap();
        assert_eq!(builder.commitments().unwrap(), &committed[..]);

        let newer = witness_for_member(&pk, &mut rng, &witness.e, 8);
        builder.update_commit(&newer).unwrap();
        assert_ne!(builder.commitments().unwrap(), &committed[..]);
        assert_eq!(builder.index(), 8);
    }

    #[test]
    fn proof_answers_with_the_bound_randomizer() {
        let mut rng = rng();
        let (_, pk) = tiny_key_pair(&mut rng, 2);
        let witness = fabricated_witness(&pk, &mut rng, 1);
        let randomizer = revocation::new_proof_randomizer(&mut rng).unwrap();

        let mut builder = NonRevocationProofBuilder::new(pk, witness.clone(), randomizer.clone());
        let _ = builder.commit(&mut rng).unwrap();

        let challenge = arith::random_bigint(&mut rng, 256).unwrap();
        let proof = builder.create_proof(&challenge).unwrap();
        assert_eq!(
            proof.responses["alpha"],
            &randomizer + &challenge * &witness.e
        );
    }
}

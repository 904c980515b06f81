//! Proofs of knowledge of a CL signature with selective attribute disclosure.
//!
//! ## Intuition
//!
//! The prover re-randomizes the signature into an unlinkable `(A', e, v')`
//! and runs a multi-statement Schnorr protocol over the CL equation: the
//! hidden exponents (`e`, `v'`, and every undisclosed attribute) each get a
//! commitment randomizer, a single group-element commitment
//! `Z = A'^{e~} * S^{v~} * prod R_i^{m~_i}` is formed, and after the
//! Fiat-Shamir challenge every hidden exponent answers with
//! `randomizer + challenge * secret`, over the integers. Disclosed attributes
//! travel in the clear.
//!
//! The protocol has three ordered phases, after which the builder is
//! discarded:
//! 1. *Build* (via [`Credential::create_disclosure_proof_builder`]):
//!    signature randomization and randomizer sampling, plus setup of the
//!    linked range and non-revocation sub-proofs.
//! 2. *Commit* ([`DisclosureProofBuilder::commit`]): emit the ordered
//!    commitment list that feeds the challenge hash.
//! 3. *Response* ([`DisclosureProofBuilder::create_proof`]): produce the
//!    final [`ProofD`].
//!
//! The commitment randomizer of attribute 0 (the user secret) is supplied
//! externally so that proofs from different credentials of one user can share
//! it; the randomizer of the revocation attribute is owned by the
//! non-revocation sub-proof. Both linkages work the same way: one randomizer,
//! one response, two statements tied together.
//!
//! [`Credential::create_disclosure_proof_builder`]: crate::credential::Credential::create_disclosure_proof_builder

use crate::arith;
use crate::camenisch_lysyanskaya::CLSignature;
use crate::common::*;
use crate::keys::PublicKey;
use crate::proofs::challenge::{Challenge, ChallengeBuilder};
use crate::proofs::nonrevocation::NonRevocationProofBuilder;
use crate::rangeproof;
use crate::revocation;
use num_bigint::Sign;
use num_traits::One;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The commitment a keyshare server contributes to the proof of the user
/// secret, when part of that secret lives on a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPCommitment {
    /// The server's share `R_0^{share}`.
    pub p: BigInt,
    /// The server's commitment to its share's randomizer.
    pub p_commit: BigInt,
}

/// Holds the state for producing a disclosure proof, between signature
/// randomization and the response phase.
///
/// Single-use: create one per proof, run the phases in order, discard.
#[derive(Debug)]
pub struct DisclosureProofBuilder {
    pk: PublicKey,
    attributes: Vec<BigInt>,
    randomized_signature: CLSignature,
    e_commit: BigInt,
    v_commit: BigInt,
    attr_randomizers: HashMap<usize, BigInt>,
    /// Merged keyshare commitments; the commitment phase multiplies the
    /// Schnorr commitment into a copy of this.
    z: BigInt,
    disclosed_attributes: Vec<usize>,
    undisclosed_attributes: Vec<usize>,
    nonrev_builder: Option<NonRevocationProofBuilder>,
    nonrev_attribute: Option<usize>,
    rp_structures: BTreeMap<usize, Vec<rangeproof::ProofStructure>>,
    /// Commitment-phase output of the range statements, cached on first
    /// commit so that repeated commitment emission is deterministic.
    rp_commits: Option<BTreeMap<usize, Vec<(Vec<BigInt>, rangeproof::ProofCommit)>>>,
}

/// Compute, given the disclosed indices, the sorted list of undisclosed ones.
fn undisclosed_attributes(disclosed: &[usize], num_attributes: usize) -> Vec<usize> {
    (0..num_attributes)
        .filter(|index| !disclosed.contains(index))
        .collect()
}

impl DisclosureProofBuilder {
    /// Run the build phase: randomize the signature and sample the commitment
    /// randomizers for every hidden exponent.
    ///
    /// `nonrev` carries the revocation attribute index and an
    /// already-committed non-revocation builder whose randomizer this builder
    /// adopts for that attribute.
    pub(crate) fn new(
        pk: PublicKey,
        signature: &CLSignature,
        attributes: Vec<BigInt>,
        disclosed: &[usize],
        range_statements: Option<&BTreeMap<usize, Vec<rangeproof::Statement>>>,
        nonrev: Option<(usize, NonRevocationProofBuilder)>,
        rng: &mut impl Rng,
    ) -> Result<DisclosureProofBuilder, Error> {
        let params = *pk.params();
        if let Some(&out_of_range) = disclosed.iter().find(|&&i| i >= attributes.len()) {
            return Err(Error::ParameterMismatch {
                capacity: attributes.len(),
                got: out_of_range + 1,
            });
        }

        let randomized_signature = signature.randomize(&pk, rng)?;
        let e_commit = arith::random_bigint(rng, params.le_commit)?;
        let v_commit = arith::random_bigint(rng, params.lv_commit)?;

        let undisclosed = undisclosed_attributes(disclosed, attributes.len());
        let mut attr_randomizers = HashMap::new();
        for &index in &undisclosed {
            let _ = attr_randomizers.insert(index, arith::random_bigint(rng, params.lm_commit)?);
        }

        let mut rp_structures = BTreeMap::new();
        if let Some(statements) = range_statements {
            for (&index, statements) in statements {
                if disclosed.contains(&index) {
                    return Err(Error::RangeOnDisclosedAttribute(index));
                }
                if index >= attributes.len() {
                    return Err(Error::ParameterMismatch {
                        capacity: attributes.len(),
                        got: index + 1,
                    });
                }
                let structures = statements
                    .iter()
                    .map(|statement| statement.proof_structure(index))
                    .collect::<Result<Vec<_>, _>>()?;
                let _ = rp_structures.insert(index, structures);
            }
        }

        let (nonrev_attribute, nonrev_builder) = match nonrev {
            Some((index, builder)) => {
                // The linkage: the non-revocation sub-proof and the main proof
                // answer for the revocation attribute with one randomizer.
                let _ = attr_randomizers.insert(index, builder.randomizer().clone());
                (Some(index), Some(builder))
            }
            None => (None, None),
        };

        Ok(DisclosureProofBuilder {
            pk,
            attributes,
            randomized_signature,
            e_commit,
            v_commit,
            attr_randomizers,
            z: BigInt::one(),
            disclosed_attributes: disclosed.to_vec(),
            undisclosed_attributes: undisclosed,
            nonrev_builder,
            nonrev_attribute,
            rp_structures,
            rp_commits: None,
        })
    }

    /// The public key this proof will verify against.
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Fold a keyshare server's commitment into the Schnorr commitment.
    pub fn merge_proof_p_commitment(&mut self, commitment: &ProofPCommitment) {
        self.z = &self.z * &commitment.p_commit % self.pk.n();
    }

    /// Run the commitment phase.
    ///
    /// `randomizers` must contain the `"secretkey"` entry, which becomes the
    /// commitment randomizer of attribute 0. Returns the ordered commitment
    /// list: `[A', Z]`, then the non-revocation commitments, then the range
    /// statement contributions in ascending attribute order (and input order
    /// within one attribute). The order feeds the challenge hash and must
    /// match the verifier's reconstruction exactly.
    pub fn commit(
        &mut self,
        randomizers: &HashMap<String, BigInt>,
        rng: &mut impl Rng,
    ) -> Result<Vec<BigInt>, Error> {
        let sk_randomizer = randomizers
            .get("secretkey")
            .ok_or(Error::MissingRandomizer("secretkey"))?;
        let _ = self.attr_randomizers.insert(0, sk_randomizer.clone());

        let n = self.pk.n();
        // Z = A'^{e~} * S^{v~} * prod_{i undisclosed} R_i^{m~_i}, on top of
        // any merged keyshare commitment.
        let mut z = self.z.clone();
        z = z * self.randomized_signature.a().modpow(&self.e_commit, n) % n;
        z = z * self.pk.s().modpow(&self.v_commit, n) % n;
        for &index in &self.undisclosed_attributes {
            let randomizer = &self.attr_randomizers[&index];
            z = z * self.pk.r()[index].modpow(randomizer, n) % n;
        }

        let mut list = vec![self.randomized_signature.a().clone(), z];

        if let Some(builder) = &self.nonrev_builder {
            list.extend_from_slice(builder.commitments()?);
        }

        if !self.rp_structures.is_empty() {
            if self.rp_commits.is_none() {
                let mut commits = BTreeMap::new();
                for (&index, structures) in &self.rp_structures {
                    let randomizer = &self.attr_randomizers[&index];
                    let mut entries = Vec::with_capacity(structures.len());
                    for structure in structures {
                        entries.push(structure.commitments_from_secrets(
                            &self.pk,
                            &self.attributes[index],
                            randomizer,
                            rng,
                        )?);
                    }
                    let _ = commits.insert(index, entries);
                }
                self.rp_commits = Some(commits);
            }
            if let Some(commits) = &self.rp_commits {
                for entries in commits.values() {
                    for (contributions, _) in entries {
                        list.extend_from_slice(contributions);
                    }
                }
            }
        }

        Ok(list)
    }

    /// Run the response phase against the given challenge, producing the
    /// final proof.
    ///
    /// All response arithmetic is over the integers. The response for `e` is
    /// computed against the offset `e' = e - 2^(Le-1)`, which shortens the
    /// transmitted value without changing what the verifier checks. An
    /// undisclosed attribute longer than `Lm` bits answers for its SHA-256
    /// image instead.
    pub fn create_proof(&self, challenge: &Challenge) -> Result<ProofD, Error> {
        let params = self.pk.params();
        let c = challenge.as_int();

        let e_prime = self.randomized_signature.e() - (BigInt::one() << (params.le - 1));
        let e_response = &self.e_commit + c * e_prime;
        let v_response = &self.v_commit + c * self.randomized_signature.v();

        let mut a_responses = BTreeMap::new();
        for &index in &self.undisclosed_attributes {
            let randomizer = self
                .attr_randomizers
                .get(&index)
                .ok_or(Error::MissingRandomizer("secretkey"))?;
            let exponent = arith::attribute_exponent(&self.attributes[index], params.lm);
            let _ = a_responses.insert(index, randomizer + c * exponent);
        }

        let mut a_disclosed = BTreeMap::new();
        for &index in &self.disclosed_attributes {
            let _ = a_disclosed.insert(index, self.attributes[index].clone());
        }

        let non_revocation_proof = match &self.nonrev_builder {
            Some(builder) => {
                let mut proof = builder.create_proof(c)?;
                // The verifier re-derives alpha from the linked attribute
                // response of this proof.
                let _ = proof.responses.remove("alpha");
                proof.linked_attribute = self.nonrev_attribute;
                Some(proof)
            }
            None => None,
        };

        let mut range_proofs = BTreeMap::new();
        if !self.rp_structures.is_empty() {
            let commits = self.rp_commits.as_ref().ok_or(Error::UninitializedBuilder)?;
            for (&index, structures) in &self.rp_structures {
                let entries = &commits[&index];
                let proofs = structures
                    .iter()
                    .zip(entries)
                    .map(|(structure, (_, commit))| structure.build_proof(commit, c))
                    .collect();
                let _ = range_proofs.insert(index, proofs);
            }
        }

        Ok(ProofD {
            c: c.clone(),
            a: self.randomized_signature.a().clone(),
            e_response,
            v_response,
            a_responses,
            a_disclosed,
            non_revocation_proof,
            range_proofs,
        })
    }

    /// The contributions of this proof to the message signed by a timestamp
    /// server: `A'` of the randomized signature, and one slot per attribute
    /// holding the disclosed value or zero.
    pub fn timestamp_request_contributions(&self) -> (BigInt, Vec<BigInt>) {
        let mut disclosed = vec![BigInt::from(0); self.attributes.len()];
        for &index in &self.disclosed_attributes {
            disclosed[index] = self.attributes[index].clone();
        }
        (self.randomized_signature.a().clone(), disclosed)
    }
}

/// A disclosure proof: proof of knowledge of a CL signature over a block of
/// attributes, revealing a subset of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofD {
    /// The Fiat-Shamir challenge this proof answers.
    pub c: BigInt,
    /// `A'` of the randomized signature.
    pub a: BigInt,
    /// Response for the signature exponent offset `e'`.
    pub e_response: BigInt,
    /// Response for the randomized blinding value `v'`.
    pub v_response: BigInt,
    /// Responses for the undisclosed attributes, by index.
    pub a_responses: BTreeMap<usize, BigInt>,
    /// The disclosed attributes, by index, in the clear.
    pub a_disclosed: BTreeMap<usize, BigInt>,
    /// Linked non-revocation proof, with its `alpha` response elided.
    pub non_revocation_proof: Option<revocation::Proof>,
    /// Linked range statement proofs, by attribute index.
    pub range_proofs: BTreeMap<usize, Vec<rangeproof::Proof>>,
}

impl ProofD {
    /// Verify the proof for a session without range statements.
    ///
    /// Keyshare sessions (where a server contributes part of the secret) need
    /// their server contribution folded in during challenge reconstruction
    /// and are not handled here.
    pub fn verify(&self, pk: &PublicKey, context: &BigInt, nonce: &BigInt) -> bool {
        self.verify_with(pk, context, nonce, false, &BTreeMap::new())
    }

    /// Verify the proof against the full session description: the transcript
    /// flag and the range statements the verifier requested.
    pub fn verify_with(
        &self,
        pk: &PublicKey,
        context: &BigInt,
        nonce: &BigInt,
        signature_session: bool,
        range_statements: &BTreeMap<usize, Vec<rangeproof::Statement>>,
    ) -> bool {
        if !self.correct_response_sizes(pk) {
            return false;
        }
        let contributions = match self.challenge_contribution(pk, range_statements) {
            Ok(contributions) => contributions,
            Err(_) => return false,
        };

        let mut transcript = if signature_session {
            ChallengeBuilder::new_signature_session()
        } else {
            ChallengeBuilder::new()
        };
        transcript.digest_int(context);
        transcript.digest_ints(&contributions);
        transcript.digest_int(nonce);
        transcript.finish().0 == self.c
    }

    /// Reconstruct the ordered commitment list this proof hashed into its
    /// challenge: `[A', Z~]` followed by the sub-proof reconstructions.
    pub fn challenge_contribution(
        &self,
        pk: &PublicKey,
        range_statements: &BTreeMap<usize, Vec<rangeproof::Statement>>,
    ) -> Result<Vec<BigInt>, Error> {
        let mut list = vec![self.a.clone(), self.reconstruct_z(pk)?];

        if let Some(proof) = &self.non_revocation_proof {
            let alpha = match proof.linked_attribute {
                Some(index) => self
                    .a_responses
                    .get(&index)
                    .ok_or(Error::RevocationAttributeMissing)?,
                None => proof
                    .responses
                    .get("alpha")
                    .ok_or(Error::RevocationAttributeMissing)?,
            };
            list.extend(proof.challenge_contributions(pk, &self.c, alpha)?);
        }

        // The requested statements and the proved ones must agree exactly.
        if range_statements.len() != self.range_proofs.len() {
            return Err(Error::ParameterMismatch {
                capacity: range_statements.len(),
                got: self.range_proofs.len(),
            });
        }
        for (index, statements) in range_statements {
            let proofs = self.range_proofs.get(index).ok_or(Error::ParameterMismatch {
                capacity: statements.len(),
                got: 0,
            })?;
            if statements.len() != proofs.len() {
                return Err(Error::ParameterMismatch {
                    capacity: statements.len(),
                    got: proofs.len(),
                });
            }
            let attribute_response = self
                .a_responses
                .get(index)
                .ok_or(Error::RangeOnDisclosedAttribute(*index))?;
            for (statement, proof) in statements.iter().zip(proofs) {
                let structure = statement.proof_structure(*index)?;
                list.extend(proof.challenge_contributions(
                    pk,
                    &structure,
                    &self.c,
                    attribute_response,
                )?);
            }
        }

        Ok(list)
    }

    /// Reconstruct the Schnorr commitment `Z~` from the responses:
    /// `Z~ = known^{-c} * A'^{e_response} * prod R_i^{a_response_i} * S^{v_response}`
    /// with `known = Z / (A'^{2^(Le-1)} * prod_disclosed R_i^{m_i})`.
    fn reconstruct_z(&self, pk: &PublicKey) -> Result<BigInt, Error> {
        let params = pk.params();
        let n = pk.n();

        let mut numerator = self.a.modpow(&(BigInt::one() << (params.le - 1)), n);
        for (&index, attribute) in &self.a_disclosed {
            let base = pk.r_at(index).ok_or(Error::ParameterMismatch {
                capacity: pk.max_attributes(),
                got: index + 1,
            })?;
            let exponent = arith::attribute_exponent(attribute, params.lm);
            numerator = numerator * arith::mod_pow(base, &exponent, n)? % n;
        }
        let known = pk.z() * arith::mod_inverse(&numerator, n)? % n;
        let known_c = arith::mod_pow(&known, &-&self.c, n)?;

        let a_e = arith::mod_pow(&self.a, &self.e_response, n)?;
        let s_v = arith::mod_pow(pk.s(), &self.v_response, n)?;
        let mut bases = BigInt::one();
        for (&index, response) in &self.a_responses {
            let base = pk.r_at(index).ok_or(Error::ParameterMismatch {
                capacity: pk.max_attributes(),
                got: index + 1,
            })?;
            bases = bases * arith::mod_pow(base, response, n)? % n;
        }

        Ok(known_c * a_e % n * bases % n * s_v % n)
    }

    /// Check the transmitted responses against their maximum sizes; anything
    /// larger indicates a malformed proof.
    fn correct_response_sizes(&self, pk: &PublicKey) -> bool {
        let params = pk.params();
        let attribute_bound = u64::from(params.lm_commit) + 1;
        let e_bound = u64::from(params.le_commit) + 1;

        self.a_responses
            .values()
            .all(|response| response.sign() != Sign::Minus && response.bits() <= attribute_bound)
            && self.e_response.sign() != Sign::Minus
            && self.e_response.bits() <= e_bound
    }
}

mod test_utils;

use idemix_crypto::Error;
use num_bigint::{BigInt, RandBigInt};
use std::thread;
use test_utils::{issue, issuer_keys, random_attributes, random_member, rng, witness_for_member};

/// A 4-attribute credential whose attribute 2 is the revocation member.
fn revocable_credential(rng: &mut impl idemix_crypto::Rng) -> idemix_crypto::credential::Credential {
    let (_, pk) = issuer_keys();
    let member = random_member(rng);
    let witness = witness_for_member(&pk, &member, 1, rng);

    let mut attributes = random_attributes(rng, 4);
    attributes[2] = member;
    issue(attributes, Some(witness), rng)
}

#[test]
fn nonrevocation_without_witness_is_refused() {
    let mut rng = rng();
    let credential = issue(random_attributes(&mut rng, 4), None, &mut rng);

    let result = credential.create_disclosure_proof_builder(&[1], None, true, &mut rng);
    assert!(matches!(result, Err(Error::MissingWitness)));
}

#[test]
fn witness_member_must_appear_among_the_attributes() {
    let mut rng = rng();
    let (_, pk) = issuer_keys();
    let member = random_member(&mut rng);
    let witness = witness_for_member(&pk, &member, 1, &mut rng);

    // Member deliberately not an attribute.
    let credential = issue(random_attributes(&mut rng, 4), Some(witness), &mut rng);
    let result = credential.create_disclosure_proof_builder(&[1], None, true, &mut rng);
    assert!(matches!(result, Err(Error::RevocationAttributeMissing)));
}

#[test]
fn nonrevocation_proof_verifies_and_elides_alpha() {
    let mut rng = rng();
    let credential = revocable_credential(&mut rng);
    assert_eq!(credential.nonrev_index().unwrap(), 2);

    let context = BigInt::from(1);
    let nonce = BigInt::from(rng.gen_biguint(80));
    let proof = credential
        .create_disclosure_proof(&[1], None, true, &context, &nonce, &mut rng)
        .unwrap();

    let nonrev = proof.non_revocation_proof.as_ref().unwrap();
    assert!(!nonrev.responses.contains_key("alpha"));
    assert_eq!(nonrev.linked_attribute, Some(2));
    assert!(proof.verify(credential.public_key(), &context, &nonce));
}

#[test]
fn severed_linkage_fails_verification() {
    let mut rng = rng();
    let credential = revocable_credential(&mut rng);

    let context = BigInt::from(1);
    let nonce = BigInt::from(rng.gen_biguint(80));
    let mut proof = credential
        .create_disclosure_proof(&[1], None, true, &context, &nonce, &mut rng)
        .unwrap();

    // Re-point the linkage at a different hidden attribute: the re-derived
    // alpha no longer matches the revocation transcript.
    if let Some(nonrev) = proof.non_revocation_proof.as_mut() {
        nonrev.linked_attribute = Some(0);
    }
    assert!(!proof.verify(credential.public_key(), &context, &nonce));
}

#[test]
fn cached_and_fresh_builders_both_produce_valid_proofs() {
    let mut rng = rng();
    let credential = revocable_credential(&mut rng);
    credential.nonrev_prepare_cache(&mut rng).unwrap();

    let context = BigInt::from(1);
    let nonce = BigInt::from(rng.gen_biguint(80));

    // First proof consumes the prepared builder, second builds fresh.
    let first = credential
        .create_disclosure_proof(&[1], None, true, &context, &nonce, &mut rng)
        .unwrap();
    let second = credential
        .create_disclosure_proof(&[1], None, true, &context, &nonce, &mut rng)
        .unwrap();

    assert!(first.verify(credential.public_key(), &context, &nonce));
    assert!(second.verify(credential.public_key(), &context, &nonce));

    // Distinct randomizers imply distinct linked responses.
    assert_ne!(first.a_responses[&2], second.a_responses[&2]);
}

#[test]
fn concurrent_sessions_on_one_credential_all_verify() {
    let mut rng = rng();
    let credential = revocable_credential(&mut rng);
    credential.nonrev_prepare_cache(&mut rng).unwrap();

    let context = BigInt::from(1);
    let nonce = BigInt::from(rng.gen_biguint(80));

    let proofs = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let credential = &credential;
                let context = &context;
                let nonce = &nonce;
                scope.spawn(move || {
                    let mut rng = rand::thread_rng();
                    credential
                        .create_disclosure_proof(&[1], None, true, context, nonce, &mut rng)
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    for proof in &proofs {
        assert!(proof.verify(credential.public_key(), &context, &nonce));
    }
    // No two sessions shared the linked randomizer.
    for (i, first) in proofs.iter().enumerate() {
        for second in &proofs[i + 1..] {
            assert_ne!(first.a_responses[&2], second.a_responses[&2]);
        }
    }
}

#[test]
fn updated_witnesses_refresh_the_cached_builder() {
    let mut rng = rng();
    let (_, pk) = issuer_keys();
    let member = random_member(&mut rng);
    let witness = witness_for_member(&pk, &member, 3, &mut rng);

    let mut attributes = random_attributes(&mut rng, 4);
    attributes[2] = member.clone();
    let credential = issue(attributes, Some(witness), &mut rng);

    credential.nonrev_prepare_cache(&mut rng).unwrap();
    // Preparing again against the same epoch leaves the builder untouched
    // and the session still completes.
    credential.nonrev_prepare_cache(&mut rng).unwrap();

    let context = BigInt::from(1);
    let nonce = BigInt::from(rng.gen_biguint(80));
    let proof = credential
        .create_disclosure_proof(&[], None, true, &context, &nonce, &mut rng)
        .unwrap();
    assert!(proof.verify(credential.public_key(), &context, &nonce));
    assert_eq!(
        proof.non_revocation_proof.as_ref().unwrap().accumulator.index,
        3
    );
}

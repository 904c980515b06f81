//! Shared fixtures: a fixed production-size issuer key (so tests never pay
//! safe-prime generation) and credential issuance helpers.
#![allow(dead_code)]

use idemix_crypto::camenisch_lysyanskaya::sign_message_block;
use idemix_crypto::credential::{generate_secret_attribute, Credential};
use idemix_crypto::keys::{PrivateKey, PublicKey};
use idemix_crypto::params::PARAMS_1024;
use idemix_crypto::revocation::{Accumulator, Witness};
use idemix_crypto::Rng;
use num_bigint::{BigInt, RandBigInt};
use rand::SeedableRng;

/// Seeded rng for replicable tests.
pub fn rng() -> impl Rng {
    const TEST_RNG_SEED: [u8; 32] = *b"NEVER USE THIS FOR ANYTHING REAL";
    rand::rngs::StdRng::from_seed(TEST_RNG_SEED)
}

// A fixed 1024-bit issuer key: safe primes p and q, S a quadratic residue
// mod n, and Z, R[i] powers of S.
const P_HEX: &str = "a95a38ad4427f2cb717a9d8458432e886f43e9ad05f41fe234b2e433a5eecd4968384c88c76a42cf12cb27d795c873e9754883e922c0fa956752c69266e109bf";
const Q_HEX: &str = "d94f6068bf4ee039dfbe4191ef031ff59320edce09c034fadf5d97c7561ea198631c35cfa51f39547d460f88729194fccedce9c7fe1726a171a13e8f28bd3cd7";
const N_HEX: &str = "8fc1fca97cb46330d09621ce361ab63751c7f9aeb2bf5800350534e8189c80972b42d1a0db5800c0c02cedac94d65b405aa02e5e2ed46d67f4751b0e8473876bff2cf02691166e20b9f65e30ae4751fe12191b5a78f71d3e24807041f1b070d08b5dbc020662904e92c23d9e152178c53b2077768532937a0f67e66c2f4af369";
const S_HEX: &str = "2f15714188fd5ed7a679a92212cab31d574a9a4201d15257d52ea6558c9ce3b776617d99c609311c3f0bf10d34273a98c808c33c6a0271f5135d81abd7852218d70fc81611f807b57ea3003c62a6bb65a726ec8159c92c5d13b7c9d4d91f9e9fd65cc3f11ddbe6d950a366d91272ff654e3606a49b573ad4a06acafd8608f2b7";
const Z_HEX: &str = "7c32e8f8752a025932e0b8e4c78a80d87cdf548cb15cc4769b501d38d6421f9db8ee3fa6712f465246122362e90e84af63af31c311fbf0a5875deb77c57ad3b72b0113da15436ea7c2de4e767221887055a744aed591443537fd35d3092fb2f28c854eabfc85e4d8ec8d2699f7e5d5f92ee38862235cb7986679854a4b4a1aad";
const R_HEX: [&str; 6] = [
    "6ab8631595a187d4b4c92ee739f79cfdc3cf07c5b188b4a010a1e7e36e5f9c6b420ac77e7aef11246129ec29c40c6ab81c759279e9dc3b86559586995ae60b7da6a8574e3a096d515031d29785f86e2f9324cf11dab4f9bcfca79c4567b25519a807b1f8b8e03e8a6cbf4279a98268efcad13d0a57cf96a0b7535e807c1de601",
    "420352d61df90bb7d55cab9ce0b0b4d77596469adcaeff3d9a85a9a1127297300c525a3eec37e8b29bde903039accd4780cc58a2dae28d92af419dffa70e311f28cbd9807c30db89fbaef156f8f9ff6b4f10b8ff7424b74f2a4665b0483f45c97f86927b584301238b4ed154030ded1c44c79817353e90a4fa0b7716ffc84661",
    "4f4acf5f3004da675123a1c195f6cd4d78e4128ba952ad9b9cc00c2de19fd1793e089bc280114cf29777cf158c45ac066c369d77a96e41178442275f3edec3b8969963cc34014bb3ea82d997dc36570cc97fe254a288bc8a85a35f5ebbe01c6ee60aa252cd911a8bc1e187c363882a32824f9ca340738a19969e21f7753a4def",
    "4617f012444f1f2c2c068f1546120ccd2676c32b3bf5c8bb2f20be201059ca9c565bf31102d6b5d44239b2f7fb7c84b3f9525affbd48b5286f2e85ab1bbc871bcf600b86b150aa387663b725c8b2d4cc3ff1b64aa79455662c5acf8854f55bb0746321cd8665768314ca3cfb8ceb2bf9a067c26c9b56f72eef5356f0b58586b9",
    "0bc5f67e7e8b771a952fdd1ce01e1d396c98a6e587d85608fb315e0409e726e2a82441e05b71186bc626c3104e78ab06b66aa09e7c02215540b6bb66dbec297a76711171d4e7931a808c86b3b9fa8024f5bf96bbc0e6ab5f92be72f0c6ed554195445f1925975df35187c2f1ddc202de26f315db08624f709bea2203c86e7308",
    "400827d25addffbf93e3b44c50f1f0e16002caad7250dfec713b9778e198760bfc3c6fe4069a5ab2698cc0c871d6a31c4cc5050c0117fa9e1c47854dcf69882c7423a19bd0abf8e4a9edab33395f784fba67d8573fc4c5926041b796bd05468fbed5ce0880a3cc4dc9a04f6066fb737088582680a00ec05ac0995468c570d459",
];

fn from_hex(hex: &str) -> BigInt {
    BigInt::parse_bytes(hex.as_bytes(), 16).expect("fixture hex is valid")
}

/// The fixed issuer key pair.
pub fn issuer_keys() -> (PrivateKey, PublicKey) {
    let sk = PrivateKey::new(from_hex(P_HEX), from_hex(Q_HEX));
    let pk = PublicKey::new(
        from_hex(N_HEX),
        from_hex(Z_HEX),
        from_hex(S_HEX),
        R_HEX.iter().map(|hex| from_hex(hex)).collect(),
        PARAMS_1024,
    );
    (sk, pk)
}

/// A user secret followed by `count - 1` random 250-bit attributes.
pub fn random_attributes(rng: &mut impl Rng, count: usize) -> Vec<BigInt> {
    let mut attributes = vec![generate_secret_attribute(rng).unwrap()];
    while attributes.len() < count {
        attributes.push(BigInt::from(rng.gen_biguint(250)));
    }
    attributes
}

/// Issue a credential over the given attributes under the fixed key.
pub fn issue(attributes: Vec<BigInt>, witness: Option<Witness>, rng: &mut impl Rng) -> Credential {
    let (sk, pk) = issuer_keys();
    let signature = sign_message_block(&sk, &pk, &attributes, rng).unwrap();
    Credential::new(pk, signature, attributes, witness).unwrap()
}

/// Fabricate a revocation witness for the given member at the given
/// accumulator epoch: pick a base and derive the accumulator value that makes
/// the witness equation hold.
pub fn witness_for_member(pk: &PublicKey, member: &BigInt, index: u64, rng: &mut impl Rng) -> Witness {
    let u = BigInt::from(rng.gen_biguint(1020)) + BigInt::from(2);
    let nu = u.modpow(member, pk.n());
    Witness {
        u,
        e: member.clone(),
        accumulator: Accumulator { nu, index },
    }
}

/// A random prime suitable as a revocation member attribute.
pub fn random_member(rng: &mut impl Rng) -> BigInt {
    loop {
        let candidate = BigInt::from(rng.gen_biguint(60)) | BigInt::from(1);
        // Cheap Fermat sieve is plenty for fixture primes.
        if candidate > BigInt::from(1000)
            && BigInt::from(2).modpow(&(&candidate - BigInt::from(1)), &candidate)
                == BigInt::from(1)
        {
            return candidate;
        }
    }
}

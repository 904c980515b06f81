//! System parameters: the bit-length constants that shape every value in the
//! protocol, bundled per issuer key length.
//!
//! The derived lengths are a pure function of the base lengths; the
//! [`SystemParameters::new`] constructor is the only way to obtain a set, so
//! the derivation invariant holds by construction.

use serde::{Deserialize, Serialize};

/// Bit-length constants for one issuer key length.
///
/// Base lengths (`ln`, `lm`, `lstatzk`, `lh`, `le_prime`) are chosen per key
/// length; everything else is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemParameters {
    /// Bit length of the modulus `n`.
    pub ln: u32,
    /// Maximum bit length of an attribute; longer attributes are hashed.
    pub lm: u32,
    /// Statistical zero-knowledge slack.
    pub lstatzk: u32,
    /// Bit length of the challenge hash.
    pub lh: u32,
    /// Bit length of the interval the signature prime `e` is drawn from.
    pub le_prime: u32,

    /// Bit length of the signature prime `e`.
    pub le: u32,
    /// Bit length of the commitment randomizer for `e`.
    pub le_commit: u32,
    /// Bit length of a hidden-attribute commitment randomizer.
    pub lm_commit: u32,
    /// Bit length of the signature-randomization exponent.
    pub l_ra: u32,
    /// Bit length of the signature blinding value `v`.
    pub lv: u32,
    /// Bit length of the commitment randomizer for `v`.
    pub lv_commit: u32,
}

impl SystemParameters {
    /// Derive a full parameter set from the base bit lengths.
    pub const fn new(ln: u32, lm: u32, lstatzk: u32, lh: u32, le_prime: u32) -> Self {
        let lv = ln + 2 * lstatzk + lh + lm + 4;
        SystemParameters {
            ln,
            lm,
            lstatzk,
            lh,
            le_prime,
            le: lstatzk + lh + lm + 5,
            le_commit: le_prime + lstatzk + lh,
            lm_commit: lm + lstatzk + lh,
            l_ra: ln + lstatzk,
            lv,
            lv_commit: lv + lstatzk + lh,
        }
    }

    /// The default parameter set for a given issuer key length, if one is
    /// defined. Defined lengths are 1024, 2048 and 4096.
    pub fn for_key_length(bits: u32) -> Option<SystemParameters> {
        match bits {
            1024 => Some(PARAMS_1024),
            2048 => Some(PARAMS_2048),
            4096 => Some(PARAMS_4096),
            _ => None,
        }
    }
}

/// Default parameters for 1024-bit issuer keys.
pub const PARAMS_1024: SystemParameters = SystemParameters::new(1024, 256, 80, 256, 120);

/// Default parameters for 2048-bit issuer keys.
pub const PARAMS_2048: SystemParameters = SystemParameters::new(2048, 256, 128, 256, 120);

/// Default parameters for 4096-bit issuer keys.
pub const PARAMS_4096: SystemParameters = SystemParameters::new(4096, 512, 128, 256, 120);

/// The issuer key lengths for which default parameters are defined.
pub const DEFAULT_KEY_LENGTHS: [u32; 3] = [1024, 2048, 4096];

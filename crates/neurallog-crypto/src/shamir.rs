//! Shamir threshold secret sharing over GF(2^8)
//!
//! A secret of L bytes splits into n shares of L bytes; any k reconstruct.
//! Arithmetic is byte-wise in the AES field (x^8 + x^4 + x^3 + x + 1), so
//! every byte value maps injectively and reconstruction is exact. Share x
//! coordinates are 1-based; x = 0 is reserved for the secret itself.

use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::encoding::base64_bytes;
use crate::errors::{CryptoError, Result};

/// One share of a split secret.
///
/// The serialized form carries `y` as standard Base64:
/// `{"x": <1..255>, "y": "<base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretShare {
    pub x: u8,
    #[serde(with = "base64_bytes")]
    pub y: Vec<u8>,
}

const FIELD_POLY: u16 = 0x11b;

fn gf_mul(a: u8, b: u8) -> u8 {
    let mut a = a as u16;
    let mut b = b as u16;
    let mut product = 0u16;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a <<= 1;
        if a & 0x100 != 0 {
            a ^= FIELD_POLY;
        }
        b >>= 1;
    }
    product as u8
}

fn gf_pow(mut base: u8, mut exponent: u8) -> u8 {
    let mut result = 1u8;
    while exponent != 0 {
        if exponent & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exponent >>= 1;
    }
    result
}

// a^254 = a^-1 in GF(2^8); zero has no inverse
fn gf_inv(a: u8) -> Result<u8> {
    if a == 0 {
        return Err(CryptoError::ShamirNoModularInverse);
    }
    Ok(gf_pow(a, 254))
}

fn gf_div(a: u8, b: u8) -> Result<u8> {
    Ok(gf_mul(a, gf_inv(b)?))
}

/// Evaluate a polynomial (coefficients low-to-high) at x via Horner's rule.
fn poly_eval(coefficients: &[u8], x: u8) -> u8 {
    let mut value = 0u8;
    for &coefficient in coefficients.iter().rev() {
        value = gf_mul(value, x) ^ coefficient;
    }
    value
}

/// Split `secret` into `n` shares with reconstruction threshold `k`,
/// drawing polynomial coefficients from the OS RNG.
pub fn split(secret: &[u8], n: u8, k: u8) -> Result<Vec<SecretShare>> {
    split_with_rng(secret, n, k, &mut rand::rngs::OsRng)
}

/// [`split`] with a caller-supplied RNG.
pub fn split_with_rng<R: RngCore + CryptoRng>(
    secret: &[u8],
    n: u8,
    k: u8,
    rng: &mut R,
) -> Result<Vec<SecretShare>> {
    if k < 2 {
        return Err(CryptoError::ShamirBadParams(format!(
            "threshold must be at least 2, got {}",
            k
        )));
    }
    if n < k {
        return Err(CryptoError::ShamirBadParams(format!(
            "share count {} is below threshold {}",
            n, k
        )));
    }
    if secret.is_empty() {
        return Err(CryptoError::ShamirBadParams("secret is empty".into()));
    }

    let mut shares: Vec<SecretShare> = (1..=n)
        .map(|x| SecretShare {
            x,
            y: Vec::with_capacity(secret.len()),
        })
        .collect();

    let mut coefficients = vec![0u8; k as usize];
    for &secret_byte in secret {
        coefficients[0] = secret_byte;
        rng.fill_bytes(&mut coefficients[1..]);
        // A zero leading coefficient would drop the effective threshold
        let last = coefficients.len() - 1;
        while coefficients[last] == 0 {
            coefficients[last] = rng.gen();
        }
        for share in shares.iter_mut() {
            share.y.push(poly_eval(&coefficients, share.x));
        }
    }
    Ok(shares)
}

/// Reconstruct a secret from at least `threshold` shares by Lagrange
/// interpolation at x = 0. The first `threshold` shares are used.
pub fn reconstruct(shares: &[SecretShare], threshold: u8) -> Result<Vec<u8>> {
    if threshold < 2 {
        return Err(CryptoError::ShamirBadParams(format!(
            "threshold must be at least 2, got {}",
            threshold
        )));
    }
    if shares.len() < threshold as usize {
        return Err(CryptoError::ShamirBadParams(format!(
            "{} shares supplied, {} required",
            shares.len(),
            threshold
        )));
    }

    let points = &shares[..threshold as usize];
    let length = points[0].y.len();
    if points.iter().any(|share| share.y.len() != length) {
        return Err(CryptoError::ShamirMismatchedShareLengths);
    }
    for (i, share) in points.iter().enumerate() {
        if share.x == 0 {
            return Err(CryptoError::ShamirBadParams(
                "x = 0 is reserved for the secret".into(),
            ));
        }
        if points[..i].iter().any(|other| other.x == share.x) {
            return Err(CryptoError::ShamirDuplicateX(share.x));
        }
    }

    let mut secret = Vec::with_capacity(length);
    for position in 0..length {
        let mut byte = 0u8;
        for (i, share) in points.iter().enumerate() {
            // L_i(0) = prod_{j != i} x_j / (x_j ^ x_i)
            let mut basis = 1u8;
            for (j, other) in points.iter().enumerate() {
                if i != j {
                    basis = gf_mul(basis, gf_div(other.x, other.x ^ share.x)?);
                }
            }
            byte ^= gf_mul(share.y[position], basis);
        }
        secret.push(byte);
    }
    Ok(secret)
}

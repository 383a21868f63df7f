// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The authenticated-encryption envelope every server-visible byte passes
//! through.
//!
//! Layout, low to high offset: `nonce (16) || aead_tag (16) || ciphertext`.
//! The AEAD plaintext is `version (4) || block_bytes || hmac_sha256(key,
//! version || block_bytes) (32)`. The inner HMAC is redundant given AEAD
//! already authenticates its plaintext, but it makes the freshness check
//! explicit per spec and exercises the crate's constant-time comparison
//! path independent of the AEAD implementation's own tag check.

use aes_gcm::aead::generic_array::{typenum::U16, GenericArray};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::AesGcm;
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use static_assertions::const_assert_eq;

use crate::{ProtocolError, KEY_SIZE};

type Aes128Gcm16 = AesGcm<aes_gcm::aes::Aes128, U16>;
type HmacSha256 = Hmac<Sha256>;

const VERSION_SIZE: usize = 4;
const NONCE_SIZE: usize = 16;
const TAG_SIZE: usize = 16;
const MAC_SIZE: usize = 32;

const_assert_eq!(KEY_SIZE, 16);

/// A secret symmetric key, generated once at client construction and never
/// transmitted to the server.
#[derive(Clone)]
pub struct Key([u8; KEY_SIZE]);

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(..)")
    }
}

impl Key {
    /// Generates a fresh random key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

fn compute_hmac(key: &Key, msg: &[u8]) -> [u8; MAC_SIZE] {
    let mut mac =
        HmacSha256::new_from_slice(&key.0).expect("HMAC-SHA256 accepts any key length");
    mac.update(msg);
    mac.finalize().into_bytes().into()
}

/// Encrypts one serialized block. Every call derives a fresh random 4-byte
/// version and a fresh random AEAD nonce, so encrypting the same plaintext
/// twice yields ciphertexts differing in at least the nonce and AEAD tag.
pub fn encrypt<R: RngCore + CryptoRng>(
    key: &Key,
    block_bytes: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut version = [0u8; VERSION_SIZE];
    rng.fill_bytes(&mut version);

    let mut plaintext = Vec::with_capacity(VERSION_SIZE + block_bytes.len() + MAC_SIZE);
    plaintext.extend_from_slice(&version);
    plaintext.extend_from_slice(block_bytes);
    let mac = compute_hmac(key, &plaintext);
    plaintext.extend_from_slice(&mac);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut nonce_bytes);
    let nonce = GenericArray::from_slice(&nonce_bytes);

    let cipher = Aes128Gcm16::new(GenericArray::from_slice(&key.0));
    let tag = cipher
        .encrypt_in_place_detached(nonce, b"", &mut plaintext)
        .map_err(|_| ProtocolError::Internal)?;

    let mut ciphertext = Vec::with_capacity(NONCE_SIZE + TAG_SIZE + plaintext.len());
    ciphertext.extend_from_slice(&nonce_bytes);
    ciphertext.extend_from_slice(&tag);
    ciphertext.extend_from_slice(&plaintext);
    Ok(ciphertext)
}

/// Decrypts one ciphertext blob produced by [`encrypt`]. Any AEAD or inner
/// HMAC mismatch surfaces as [`ProtocolError::AuthFailure`]; callers inside
/// `read_path` treat that identically to "this slot held a dummy".
pub fn decrypt(key: &Key, ciphertext: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if ciphertext.len() < NONCE_SIZE + TAG_SIZE + VERSION_SIZE + MAC_SIZE {
        return Err(ProtocolError::AuthFailure);
    }

    let nonce = GenericArray::from_slice(&ciphertext[..NONCE_SIZE]);
    let tag = GenericArray::from_slice(&ciphertext[NONCE_SIZE..NONCE_SIZE + TAG_SIZE]);
    let mut buffer = ciphertext[NONCE_SIZE + TAG_SIZE..].to_vec();

    let cipher = Aes128Gcm16::new(GenericArray::from_slice(&key.0));
    cipher
        .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
        .map_err(|_| ProtocolError::AuthFailure)?;

    let (versioned_block, mac) = buffer.split_at(buffer.len() - MAC_SIZE);
    let expected_mac = compute_hmac(key, versioned_block);
    if expected_mac.ct_eq(mac).unwrap_u8() != 1 {
        return Err(ProtocolError::AuthFailure);
    }

    Ok(versioned_block[VERSION_SIZE..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn round_trips() {
        let mut rng = StdRng::seed_from_u64(0);
        let key = Key::generate(&mut rng);
        let plaintext = b"0123456789abcdef".to_vec();
        let ciphertext = encrypt(&key, &plaintext, &mut rng).unwrap();
        assert_eq!(decrypt(&key, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn flipping_any_byte_breaks_authentication() {
        let mut rng = StdRng::seed_from_u64(1);
        let key = Key::generate(&mut rng);
        let ciphertext = encrypt(&key, b"hello", &mut rng).unwrap();

        for i in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                decrypt(&key, &tampered),
                Err(ProtocolError::AuthFailure),
                "byte {i} flip went undetected"
            );
        }
    }

    #[test]
    fn encrypting_the_same_plaintext_twice_differs_in_nonce_and_tag() {
        let mut rng = StdRng::seed_from_u64(2);
        let key = Key::generate(&mut rng);
        let a = encrypt(&key, b"abcd", &mut rng).unwrap();
        let b = encrypt(&key, b"abcd", &mut rng).unwrap();
        assert_ne!(a[..NONCE_SIZE + TAG_SIZE], b[..NONCE_SIZE + TAG_SIZE]);
    }

    #[test]
    fn decrypt_rejects_undersized_input() {
        let mut rng = StdRng::seed_from_u64(3);
        let key = Key::generate(&mut rng);
        assert_eq!(decrypt(&key, &[0u8; 4]), Err(ProtocolError::AuthFailure));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deterministic encryption of a single identity claim value.
//!
//! ## Construction
//!
//! Two subkeys are derived from the shared secret with HMAC-SHA256 under fixed
//! labels. The nonce is synthetic: the first 12 bytes of
//! HMAC-SHA256(nonce key, plaintext). The value is then sealed with
//! AES-256-GCM, so the output is `base64url(nonce || ciphertext || tag)`.
//!
//! ## Determinism
//!
//! The same `(secret, plaintext)` pair always yields the same ciphertext. This
//! is the one deliberate deviation from randomised AEAD: equal identifiers
//! produce equal claim values, which leaks equality between tokens for the
//! same subject but nothing about the identifier itself. Integrity is still
//! enforced by the GCM tag and by re-deriving the synthetic nonce on decrypt.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const ENCRYPTION_KEY_LABEL: &[u8] = b"sealed-claim/v1/encryption";
const NONCE_KEY_LABEL: &[u8] = b"sealed-claim/v1/nonce";
const AAD: &[u8] = b"sealed-claim/v1";
const TAG_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("{0} must not be empty")]
    InvalidInput(&'static str),

    #[error("claim encryption failed")]
    EncryptFailed,

    #[error("claim decryption failed")]
    DecryptFailed,
}

/// Cipher bound to one shared secret.
pub struct ClaimCipher {
    key: LessSafeKey,
    nonce_key: [u8; 32],
}

impl std::fmt::Debug for ClaimCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClaimCipher(<redacted>)")
    }
}

impl ClaimCipher {
    pub fn new(secret: &str) -> Result<Self, CipherError> {
        if secret.is_empty() {
            return Err(CipherError::InvalidInput("secret"));
        }

        let encryption_key = derive(secret.as_bytes(), ENCRYPTION_KEY_LABEL)?;
        let nonce_key = derive(secret.as_bytes(), NONCE_KEY_LABEL)?;

        let unbound =
            UnboundKey::new(&AES_256_GCM, &encryption_key).map_err(|_| CipherError::EncryptFailed)?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            nonce_key,
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::InvalidInput("plaintext"));
        }

        let nonce_bytes = self.synthetic_nonce(plaintext.as_bytes())?;

        let mut sealed = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(AAD),
                &mut sealed,
            )
            .map_err(|_| CipherError::EncryptFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(Base64UrlUnpadded::encode_string(&out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        if ciphertext.is_empty() {
            return Err(CipherError::InvalidInput("ciphertext"));
        }

        let raw = Base64UrlUnpadded::decode_vec(ciphertext).map_err(|_| CipherError::DecryptFailed)?;
        if raw.len() <= NONCE_LEN + TAG_LEN {
            return Err(CipherError::DecryptFailed);
        }

        let (nonce_part, sealed_part) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_part).map_err(|_| CipherError::DecryptFailed)?;

        let mut in_out = sealed_part.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::from(AAD), &mut in_out)
            .map_err(|_| CipherError::DecryptFailed)?;

        let mut mac = self.nonce_mac()?;
        mac.update(plaintext);
        mac.verify_truncated_left(nonce_part)
            .map_err(|_| CipherError::DecryptFailed)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::DecryptFailed)
    }

    fn nonce_mac(&self) -> Result<HmacSha256, CipherError> {
        HmacSha256::new_from_slice(&self.nonce_key).map_err(|_| CipherError::EncryptFailed)
    }

    fn synthetic_nonce(&self, plaintext: &[u8]) -> Result<[u8; NONCE_LEN], CipherError> {
        let mut mac = self.nonce_mac()?;
        mac.update(plaintext);
        let digest = mac.finalize().into_bytes();
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        Ok(nonce)
    }
}

fn derive(secret: &[u8], label: &[u8]) -> Result<[u8; 32], CipherError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| CipherError::EncryptFailed)?;
    mac.update(label);
    let mut key = [0u8; 32];
    key.copy_from_slice(&mac.finalize().into_bytes());
    Ok(key)
}

/// Encrypt `plaintext` under `secret`.
pub fn encrypt(secret: &str, plaintext: &str) -> Result<String, CipherError> {
    ClaimCipher::new(secret)?.encrypt(plaintext)
}

/// Reverse [`encrypt`]. Fails with [`CipherError::DecryptFailed`] for
/// ciphertext produced under another secret or not produced by `encrypt`.
pub fn decrypt(secret: &str, ciphertext: &str) -> Result<String, CipherError> {
    ClaimCipher::new(secret)?.decrypt(ciphertext)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key pair resolution.
//!
//! ## Security
//!
//! - Key material is read once and kept for the process lifetime
//! - The issuer only reads the private key, the verifier only the public key
//! - `Debug` never prints key material
//!
//! Call [`KeyStore::preload`] at startup, before the listener accepts
//! connections, so request handlers only ever observe a fully resolved store.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

/// Where a piece of key material comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// PEM file on disk.
    File(PathBuf),
    /// PEM text embedded in configuration.
    Inline(String),
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::File(path) => f.debug_tuple("File").field(path).finish(),
            KeySource::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::File(path) => write!(f, "{}", path.display()),
            KeySource::Inline(_) => f.write_str("inline configuration"),
        }
    }
}

/// Resolved key locations for both halves of the pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySettings {
    pub private_key: Option<KeySource>,
    pub public_key: Option<KeySource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Private,
    Public,
}

impl KeyKind {
    fn pem_label_suffix(self) -> &'static str {
        match self {
            KeyKind::Private => "PRIVATE KEY",
            KeyKind::Public => "PUBLIC KEY",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Private => f.write_str("signing key"),
            KeyKind::Public => f.write_str("verification key"),
        }
    }
}

/// Key material could not be made available.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("{0} is not configured")]
    NotConfigured(KeyKind),

    #[error("failed to read {kind} from {path}")]
    Unreadable {
        kind: KeyKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} from {source_desc} is not usable: {reason}")]
    InvalidMaterial {
        kind: KeyKind,
        source_desc: String,
        reason: String,
    },
}

/// PEM-encoded private key.
#[derive(Clone)]
pub struct PrivateKeyMaterial {
    pem: String,
}

impl PrivateKeyMaterial {
    /// Build the signing key for the given algorithm family.
    pub fn encoding_key(&self, algorithm: Algorithm) -> jsonwebtoken::errors::Result<EncodingKey> {
        let pem = self.pem.as_bytes();
        match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => EncodingKey::from_rsa_pem(pem),
            Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(pem),
            Algorithm::EdDSA => EncodingKey::from_ed_pem(pem),
            _ => Err(jsonwebtoken::errors::ErrorKind::InvalidAlgorithm.into()),
        }
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKeyMaterial(<redacted>)")
    }
}

/// PEM-encoded public key.
#[derive(Clone)]
pub struct PublicKeyMaterial {
    pem: String,
}

impl PublicKeyMaterial {
    /// Build the verification key for the given algorithm family.
    pub fn decoding_key(&self, algorithm: Algorithm) -> jsonwebtoken::errors::Result<DecodingKey> {
        let pem = self.pem.as_bytes();
        match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
            _ => Err(jsonwebtoken::errors::ErrorKind::InvalidAlgorithm.into()),
        }
    }
}

impl fmt::Debug for PublicKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PublicKeyMaterial(<redacted>)")
    }
}

/// Owner of the asymmetric key pair.
///
/// Each half is resolved at most once; a failed resolution is not cached, so
/// a later call re-reads the source instead of returning partial material.
#[derive(Debug)]
pub struct KeyStore {
    settings: KeySettings,
    private: OnceLock<PrivateKeyMaterial>,
    public: OnceLock<PublicKeyMaterial>,
}

impl KeyStore {
    pub fn new(settings: KeySettings) -> Self {
        Self {
            settings,
            private: OnceLock::new(),
            public: OnceLock::new(),
        }
    }

    /// Signing key for token issuance.
    pub fn private_key(&self) -> Result<&PrivateKeyMaterial, KeyError> {
        if let Some(material) = self.private.get() {
            return Ok(material);
        }
        let pem = load_pem(KeyKind::Private, self.settings.private_key.as_ref())?;
        Ok(self.private.get_or_init(|| PrivateKeyMaterial { pem }))
    }

    /// Verification key for token checks.
    pub fn public_key(&self) -> Result<&PublicKeyMaterial, KeyError> {
        if let Some(material) = self.public.get() {
            return Ok(material);
        }
        let pem = load_pem(KeyKind::Public, self.settings.public_key.as_ref())?;
        Ok(self.public.get_or_init(|| PublicKeyMaterial { pem }))
    }

    /// Resolve both keys now. A missing key is a fatal configuration error.
    pub fn preload(&self) -> Result<(), KeyError> {
        self.private_key()?;
        self.public_key()?;
        tracing::info!(
            private_key = %describe(self.settings.private_key.as_ref()),
            public_key = %describe(self.settings.public_key.as_ref()),
            "Key pair loaded"
        );
        Ok(())
    }

    /// Whether both halves of the pair are resident.
    pub fn is_loaded(&self) -> bool {
        self.private.get().is_some() && self.public.get().is_some()
    }
}

fn describe(source: Option<&KeySource>) -> String {
    source.map_or_else(|| "unset".to_string(), ToString::to_string)
}

fn load_pem(kind: KeyKind, source: Option<&KeySource>) -> Result<String, KeyError> {
    let source = source.ok_or(KeyError::NotConfigured(kind))?;

    let text = match source {
        KeySource::File(path) => std::fs::read_to_string(path).map_err(|e| KeyError::Unreadable {
            kind,
            path: path.clone(),
            source: e,
        })?,
        KeySource::Inline(pem) => pem.clone(),
    };

    let invalid = |reason: String| KeyError::InvalidMaterial {
        kind,
        source_desc: source.to_string(),
        reason,
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty".to_string()));
    }

    let parsed = pem::parse(trimmed).map_err(|e| invalid(format!("not a PEM document ({e})")))?;
    if !parsed.tag().ends_with(kind.pem_label_suffix()) {
        return Err(invalid(format!(
            "expected a `{}` block, found `{}`",
            kind.pem_label_suffix(),
            parsed.tag()
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEV_PRIVATE_KEY_PATH, DEV_PUBLIC_KEY_PATH};
    use tempfile::TempDir;

    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/primary_private.pem");
    const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/primary_public.pem");

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("write key file");
        path
    }

    #[test]
    fn loads_keys_from_files() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::File(write(&dir, "private.pem", PRIVATE_PEM))),
            public_key: Some(KeySource::File(write(&dir, "public.pem", PUBLIC_PEM))),
        });

        assert!(!store.is_loaded());
        store.preload().unwrap();
        assert!(store.is_loaded());

        let private = store.private_key().unwrap();
        assert!(private.encoding_key(Algorithm::RS256).is_ok());
        let public = store.public_key().unwrap();
        assert!(public.decoding_key(Algorithm::RS256).is_ok());
    }

    #[test]
    fn loads_inline_keys() {
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::Inline(PRIVATE_PEM.to_string())),
            public_key: Some(KeySource::Inline(PUBLIC_PEM.to_string())),
        });
        store.preload().unwrap();
    }

    #[test]
    fn development_key_pair_is_present() {
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::File(DEV_PRIVATE_KEY_PATH.into())),
            public_key: Some(KeySource::File(DEV_PUBLIC_KEY_PATH.into())),
        });
        store.preload().unwrap();
    }

    #[test]
    fn unset_key_is_not_configured() {
        let store = KeyStore::new(KeySettings::default());
        assert!(matches!(
            store.private_key(),
            Err(KeyError::NotConfigured(KeyKind::Private))
        ));
        assert!(matches!(
            store.public_key(),
            Err(KeyError::NotConfigured(KeyKind::Public))
        ));
        assert!(store.preload().is_err());
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::File(dir.path().join("absent.pem"))),
            public_key: None,
        });
        assert!(matches!(
            store.private_key(),
            Err(KeyError::Unreadable { kind: KeyKind::Private, .. })
        ));
    }

    #[test]
    fn rejects_empty_and_non_pem_material() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::File(write(&dir, "empty.pem", "  \n"))),
            public_key: Some(KeySource::Inline("definitely not a key".to_string())),
        });
        assert!(matches!(
            store.private_key(),
            Err(KeyError::InvalidMaterial { .. })
        ));
        assert!(matches!(
            store.public_key(),
            Err(KeyError::InvalidMaterial { .. })
        ));
    }

    #[test]
    fn rejects_swapped_key_halves() {
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::Inline(PUBLIC_PEM.to_string())),
            public_key: Some(KeySource::Inline(PRIVATE_PEM.to_string())),
        });
        assert!(matches!(
            store.private_key(),
            Err(KeyError::InvalidMaterial { kind: KeyKind::Private, .. })
        ));
        assert!(matches!(
            store.public_key(),
            Err(KeyError::InvalidMaterial { kind: KeyKind::Public, .. })
        ));
    }

    #[test]
    fn failed_resolution_is_retried_after_fix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.pem");
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::File(path.clone())),
            public_key: None,
        });

        assert!(store.private_key().is_err());
        std::fs::write(&path, PRIVATE_PEM).unwrap();
        assert!(store.private_key().is_ok());
    }

    #[test]
    fn resolved_key_is_cached() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "private.pem", PRIVATE_PEM);
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::File(path.clone())),
            public_key: None,
        });

        store.private_key().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(store.private_key().is_ok());
    }

    #[test]
    fn debug_output_hides_material() {
        let source = KeySource::Inline(PRIVATE_PEM.to_string());
        assert_eq!(format!("{source:?}"), "Inline(<redacted>)");

        let store = KeyStore::new(KeySettings {
            private_key: Some(source),
            public_key: None,
        });
        let material = store.private_key().unwrap();
        assert!(!format!("{material:?}").contains("BEGIN"));
        assert!(!format!("{store:?}").contains("BEGIN"));
    }

    #[test]
    fn symmetric_algorithms_have_no_key_pair_form() {
        let store = KeyStore::new(KeySettings {
            private_key: Some(KeySource::Inline(PRIVATE_PEM.to_string())),
            public_key: Some(KeySource::Inline(PUBLIC_PEM.to_string())),
        });
        assert!(store.private_key().unwrap().encoding_key(Algorithm::HS256).is_err());
        assert!(store.public_key().unwrap().decoding_key(Algorithm::HS256).is_err());
    }
}

//! # CertClone - Self-Signed Certificate Cloning
//!
//! CertClone re-issues existing X.509 certificates as self-signed clones. A clone keeps
//! the subject, serial number, validity window and extensions of the original, names its
//! own subject as issuer, and is signed by either the original private key or a freshly
//! generated RSA key. It is built entirely with rustcrypto libraries.
//!
//! ## Supported Key Types
//!
//! - **RSA**: any power-of-two modulus size of at least 128 bits for generated keys
//!   (signing needs a modulus large enough for the chosen digest)
//!
//! ## Supported Formats
//!
//! - Certificates: PEM `CERTIFICATE` blocks; extra blocks after the first are ignored
//! - Private keys: PEM `PRIVATE KEY` (PKCS#8) or `RSA PRIVATE KEY` (PKCS#1)
//! - Output keys are written as `RSA PRIVATE KEY`
//!
//! ## Quick Start
//!
//! ### Re-signing a certificate with a new key
//!
//! ```rust,no_run
//! use certclone::{issuer::resign, key::KeyPair, loader, pem_utils};
//!
//! # fn main() -> Result<(), certclone::error::CertCloneError> {
//! let loaded = loader::load(std::path::Path::new("example/example.crt"))?;
//! let key = KeyPair::generate_rsa(2048)?;
//!
//! let clone = resign(&loaded.certificate, &key)?;
//! assert_eq!(clone.subject(), clone.issuer());
//!
//! println!("{}", pem_utils::encode(&clone.to_block()?));
//! println!("{}", pem_utils::encode(&key.to_block()?));
//! # Ok(())
//! # }
//! ```
//!
//! ### Processing directories
//!
//! ```rust,no_run
//! use certclone::config::{Config, FailurePolicy};
//! use certclone::pipeline;
//!
//! # fn main() -> Result<(), certclone::error::CertCloneError> {
//! let config = Config::builder()
//!     .generate_new_key(true)
//!     .key_out("keys")
//!     .cert_out("certs")
//!     .sources(vec!["example".into(), "other".into()])
//!     .failure_policy(FailurePolicy::Continue)
//!     .build();
//!
//! let report = pipeline::run(&config)?;
//! println!("{} cloned, {} failed", report.processed.len(), report.failures.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use certclone::{error::CertCloneError, loader};
//!
//! match loader::load_key_from_bytes(b"invalid pem data") {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(CertCloneError::DecodingError(msg)) => println!("Failed to decode key: {}", msg),
//!     Err(CertCloneError::MalformedKeyError(msg)) => println!("Trailing data: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`loader`]: Reading certificates and private keys
//! - [`key`]: Key generation, import/export and signing
//! - [`cert`]: Parsed and signed certificate types, extensions
//! - [`issuer`]: Re-signing certificates as self-issued clones
//! - [`tbs_certificate`]: Low-level to-be-signed structure
//! - [`pem_utils`]: Encoded block encoding and decoding
//! - [`pipeline`]: Per-directory processing and output files
//! - [`config`]: Run parameters
//! - [`error`]: Error types

pub mod cert;
pub mod config;
pub mod error;
pub mod issuer;
pub mod key;
pub mod loader;
pub mod pem_utils;
pub mod pipeline;
pub mod pki;
pub mod tbs_certificate;

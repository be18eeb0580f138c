//! Per-directory driver: finds the input files, runs loader and re-signer, writes outputs.
//!
//! A source directory `<dir>` is expected to hold `<dir>/<name>.crt` and, unless a new key
//! is generated, `<dir>/<name>.key`, where `<name>` is the last component of `<dir>`.
//! Outputs go to `<key_out>/<name>.key` and `<cert_out>/<name>.crt`.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::cert::ParsedCertificate;
use crate::config::{Config, FailurePolicy, ReusedKeyOutput};
use crate::error::CertCloneError;
use crate::issuer;
use crate::key::{CertificateSigner, KeyPair};
use crate::loader::{self, Advisory};
use crate::pem_utils;

type Result<T> = std::result::Result<T, CertCloneError>;

/// Permissions of written key files.
pub const KEY_FILE_MODE: u32 = 0o600;
/// Permissions of written certificate files.
pub const CERT_FILE_MODE: u32 = 0o644;
/// Permissions of output directories created by a run.
pub const OUTPUT_DIR_MODE: u32 = 0o700;

/// Input file locations for one source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    /// Display form of the base name, used in logs and reports.
    pub name: String,
    pub base: OsString,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl SourceFiles {
    pub fn for_directory(dir: &Path) -> Result<Self> {
        let base = match dir.file_name() {
            Some(base) => base.to_os_string(),
            // `.` and `..` have no file name of their own.
            None => dir
                .canonicalize()
                .map_err(|e| CertCloneError::io(dir, e))?
                .file_name()
                .map(OsStr::to_os_string)
                .ok_or_else(|| {
                    CertCloneError::ValidationError(format!(
                        "{}: cannot derive a certificate name",
                        dir.display()
                    ))
                })?,
        };
        Ok(Self {
            name: base.to_string_lossy().into_owned(),
            cert_path: dir.join(file_name(&base, "crt")),
            key_path: dir.join(file_name(&base, "key")),
            base,
        })
    }
}

/// `<base>.<extension>`, without a round trip through UTF-8.
fn file_name(base: &OsStr, extension: &str) -> OsString {
    let mut name = base.to_os_string();
    name.push(".");
    name.push(extension);
    name
}

/// Result of cloning one source directory.
#[derive(Debug, Clone)]
pub struct Processed {
    pub name: String,
    pub cert_path: PathBuf,
    /// `None` when a reused key was not written out again.
    pub key_path: Option<PathBuf>,
    pub generated_key: bool,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug, Clone)]
pub struct Failure {
    pub source: PathBuf,
    pub error: CertCloneError,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub processed: Vec<Processed>,
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Processes every source directory of `config` in order.
///
/// Parameters are validated before any filesystem access. Under [`FailurePolicy::Halt`]
/// the first failure is returned as the error; under [`FailurePolicy::Continue`] it is
/// recorded in the report and the next directory is processed.
pub fn run(config: &Config) -> Result<RunReport> {
    config.validate()?;
    create_output_dir(&config.key_out)?;
    create_output_dir(&config.cert_out)?;

    let mut report = RunReport::default();
    for source in &config.sources {
        match process_directory(source, config) {
            Ok(processed) => report.processed.push(processed),
            Err(err) => match config.failure_policy {
                FailurePolicy::Halt => return Err(err),
                FailurePolicy::Continue => {
                    error!(
                        source = %source.display(),
                        error = %err,
                        "failed to clone certificate"
                    );
                    report.failures.push(Failure {
                        source: source.clone(),
                        error: err,
                    });
                }
            },
        }
    }
    Ok(report)
}

/// Clones the certificate of a single source directory.
///
/// Nothing is written unless loading, key provisioning, signing and encoding all succeed.
pub fn process_directory(dir: &Path, config: &Config) -> Result<Processed> {
    let metadata = fs::metadata(dir).map_err(|e| CertCloneError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(CertCloneError::ValidationError(format!(
            "{}: is not a directory",
            dir.display()
        )));
    }

    let files = SourceFiles::for_directory(dir)?;
    check_source_file(&files.cert_path, config.min_file_size)?;
    if !config.generate_new_key {
        check_source_file(&files.key_path, config.min_file_size)?;
    }

    info!(name = %files.name, "processing");
    let loaded = loader::load(&files.cert_path)?;
    let certificate = &loaded.certificate;
    info!(
        name = %files.name,
        subject = %certificate.subject(),
        issuer = %certificate.issuer(),
        self_issued = certificate.is_self_issued(),
        is_ca = certificate.is_ca(),
        currently_valid = certificate.validity().contains(OffsetDateTime::now_utc()),
        dns_names = ?certificate.dns_names(),
        "loaded certificate"
    );

    let key = if config.generate_new_key {
        KeyPair::generate_rsa(config.key_bits)?
    } else {
        let key = loader::load_key(&files.key_path)?;
        warn_on_key_mismatch(&files.name, certificate, &key);
        key
    };

    let signed = issuer::resign(certificate, &key)?;

    let write_key = config.generate_new_key
        || config.reused_key_output == ReusedKeyOutput::Reencode;
    let key_pem = if write_key {
        Some(pem_utils::encode(&key.to_block()?))
    } else {
        None
    };
    let cert_pem = pem_utils::encode(&signed.to_block()?);
    let key_id = format_key_id(key.key_identifier());

    let key_path = key_pem
        .is_some()
        .then(|| config.key_out.join(file_name(&files.base, "key")));
    let cert_path = config.cert_out.join(file_name(&files.base, "crt"));

    // Both files are staged next to their targets before either target is touched.
    let staged_key = match (&key_path, &key_pem) {
        (Some(path), Some(pem)) => Some(stage_output(path, pem.as_bytes(), KEY_FILE_MODE)?),
        _ => None,
    };
    let staged_cert = stage_output(&cert_path, cert_pem.as_bytes(), CERT_FILE_MODE)?;
    commit_outputs(staged_key.zip(key_path.as_deref()), (staged_cert, &cert_path))?;

    info!(
        name = %files.name,
        certificate = %cert_path.display(),
        key = ?key_path,
        key_bits = key.bits(),
        key_id = %key_id,
        signature_algorithm = ?signed.signature_algorithm(),
        "wrote self-signed clone"
    );

    Ok(Processed {
        name: files.name,
        cert_path,
        key_path,
        generated_key: config.generate_new_key,
        advisories: loaded.advisories,
    })
}

/// Creates `path` (and its parents) with [`OUTPUT_DIR_MODE`] if it does not exist yet.
pub fn create_output_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(OUTPUT_DIR_MODE);
    }
    builder
        .create(path)
        .map_err(|e| CertCloneError::io(path, e))
}

fn check_source_file(path: &Path, min_size: u64) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| CertCloneError::io(path, e))?;
    if !metadata.is_file() || metadata.len() < min_size {
        return Err(CertCloneError::ValidationError(format!(
            "{}: not a usable input file (need a regular file of at least {min_size} bytes)",
            path.display()
        )));
    }
    Ok(())
}

fn warn_on_key_mismatch(name: &str, certificate: &ParsedCertificate, key: &KeyPair) {
    match certificate.public_key() {
        Ok(public) if public == key.public_key() => {}
        _ => warn!(name, "private key does not match the certificate's public key"),
    }
}

fn format_key_id(key_id: Result<Vec<u8>>) -> String {
    match key_id {
        Ok(id) => id.iter().map(|b| format!("{b:02x}")).collect(),
        Err(err) => {
            warn!(error = %err, "cannot compute key identifier");
            "unknown".to_string()
        }
    }
}

/// Writes `contents` to a temporary file in the directory of `path`.
#[cfg_attr(not(unix), allow(unused_variables))]
fn stage_output(path: &Path, contents: &[u8], mode: u32) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| CertCloneError::io(dir, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| CertCloneError::io(file.path(), e))?;
    }

    file.write_all(contents)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| CertCloneError::io(file.path(), e))?;
    Ok(file)
}

/// Renames staged files onto their targets, key first.
///
/// If the certificate cannot be put in place, the key just written is removed again.
fn commit_outputs(
    key: Option<(NamedTempFile, &Path)>,
    (cert, cert_path): (NamedTempFile, &Path),
) -> Result<()> {
    let committed_key = match key {
        Some((staged, path)) => {
            staged
                .persist(path)
                .map_err(|e| CertCloneError::io(path, e.error))?;
            Some(path)
        }
        None => None,
    };

    if let Err(e) = cert.persist(cert_path) {
        if let Some(key_path) = committed_key {
            if let Err(remove_err) = fs::remove_file(key_path) {
                error!(
                    key = %key_path.display(),
                    error = %remove_err,
                    "cannot remove key after failed certificate write"
                );
            }
        }
        return Err(CertCloneError::io(cert_path, e.error));
    }
    Ok(())
}

use crate::error::CertCloneError;

/// Label of a DER-encoded X.509 certificate block.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
/// Label of a PKCS#8 private key block.
pub const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
/// Label of a PKCS#1 RSA private key block.
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

const BEGIN_MARKER: &[u8] = b"-----BEGIN ";
const END_MARKER: &[u8] = b"-----END ";
const DASHES: &[u8] = b"-----";

/// A labeled DER payload, as found between PEM boundary lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBlock {
    label: String,
    contents: Vec<u8>,
}

impl EncodedBlock {
    pub fn new(label: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            contents: contents.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The DER bytes carried by the block.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Fails with a `DecodingError` unless the block carries `expected` as its label.
    pub fn expect_label(&self, expected: &str) -> Result<(), CertCloneError> {
        if self.label == expected {
            Ok(())
        } else {
            Err(CertCloneError::DecodingError(format!(
                "expected a {expected} block, found {}",
                self.label
            )))
        }
    }
}

/// Convert a block into PEM text with LF line endings.
///
/// The output depends only on the label and contents, so encoding the same block
/// twice yields identical bytes.
pub fn encode(block: &EncodedBlock) -> String {
    let pem = pem::Pem::new(block.label.clone(), block.contents.clone());
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Decode the first PEM block in `input`.
///
/// Text before the first `BEGIN` line is skipped. The second element of the result is
/// whatever follows the block's `END` line, with leading whitespace removed; it is empty
/// when the block is the last thing in the input.
pub fn decode(input: &[u8]) -> Result<(EncodedBlock, &[u8]), CertCloneError> {
    let begin = find(input, BEGIN_MARKER)
        .ok_or_else(|| CertCloneError::DecodingError("no PEM block found".to_string()))?;
    let end_line = find(&input[begin..], END_MARKER)
        .map(|offset| begin + offset + END_MARKER.len())
        .ok_or_else(|| CertCloneError::DecodingError("PEM block is not terminated".to_string()))?;
    let block_end = find(&input[end_line..], DASHES)
        .map(|offset| end_line + offset + DASHES.len())
        .ok_or_else(|| {
            CertCloneError::DecodingError("PEM END boundary is truncated".to_string())
        })?;

    let parsed = pem::parse(&input[begin..block_end])?;
    let block = EncodedBlock::new(parsed.tag(), parsed.contents());
    Ok((block, input[block_end..].trim_ascii_start()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

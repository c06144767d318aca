//! ID prefixes, generation, and format validation.
//!
//! Every entity ID is `<prefix>-<16 lowercase hex chars>`, e.g.
//! `job-3fa85f6457174562`. The database generates IDs with `randomblob(8)`;
//! [`random_hex`] produces the same shape in-process for tokens and
//! Kubernetes resource suffixes.

use crate::errors::CoreError;

pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_MODULE: &str = "mod";
pub const PREFIX_JOB: &str = "job";
pub const PREFIX_ARTIFACT: &str = "art";

/// All entity prefixes, for exhaustive tests.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_PROJECT, PREFIX_MODULE, PREFIX_JOB, PREFIX_ARTIFACT];

/// Number of hex characters after the dash.
pub const ID_HEX_LEN: usize = 16;

/// Check that `id` is `<prefix>-<16 lowercase hex>`.
#[must_use]
pub fn is_valid_id(prefix: &str, id: &str) -> bool {
    let Some(rest) = id.strip_prefix(prefix).and_then(|r| r.strip_prefix('-')) else {
        return false;
    };
    rest.len() == ID_HEX_LEN
        && rest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Generate `byte_len` random bytes rendered as lowercase hex.
///
/// # Errors
///
/// Returns `CoreError::Other` if the OS random source is unavailable.
pub fn random_hex(byte_len: usize) -> Result<String, CoreError> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut bytes = vec![0u8; byte_len];
    getrandom::fill(&mut bytes)
        .map_err(|e| CoreError::Other(anyhow::anyhow!("random source unavailable: {e}")))?;
    let mut out = String::with_capacity(byte_len * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    Ok(out)
}

// SPDX-License-Identifier: PMPL-1.0-or-later

//! Caller-buffer contract for embedding hosts.
//!
//! Results are copied into an optional byte buffer the way a C host expects:
//! the full length is always returned, the copy is truncated to fit and the
//! buffer is NUL-terminated. Hosts call once without a buffer to size it.

use crate::error::{CatalogError, Result};

/// Version of the host-facing calling convention.
pub const ABI_VERSION: u32 = 1;

/// Newest binary catalog version the decoder accepts.
pub const BINARY_VERSION_SUPPORTED_MAX: u32 = crate::format::binary::VERSION_CURRENT as u32;

/// Results at or above this size are refused.
pub const RESULT_SIZE_LIMIT: usize = 16 * 1024 * 1024;

/// Copy `src` into `buf` and return the full byte length of `src`.
///
/// With a non-empty buffer at most `buf.len() - 1` bytes are copied and a NUL
/// follows them. A too-small buffer is not an error; callers compare the
/// returned length with the buffer size.
pub fn copy_to_buffer(src: &str, buf: Option<&mut [u8]>) -> Result<usize> {
    let len = src.len();
    if len >= RESULT_SIZE_LIMIT || len > i32::MAX as usize {
        return Err(CatalogError::Oversize { len });
    }

    if let Some(buf) = buf {
        if !buf.is_empty() {
            let n = len.min(buf.len() - 1);
            buf[..n].copy_from_slice(&src.as_bytes()[..n]);
            buf[n] = 0;
        }
    }
    Ok(len)
}

//! Shared constants for end-to-end tests

/// Admin credentials configured on every test server
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "admin123";

/// Token signing secret for the static auth gate
pub const JWT_SECRET: &str = "test-secret";

/// Upload policy limit configured on every test server
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Per-request timeout for the test HTTP client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long to wait for a spawned server to answer on `/`
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Minimal valid PNG file (8-byte magic + truncated body), enough for
/// content-type sniffing when the image is served back.
pub const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Build PNG-sniffable bytes of the given total size.
pub fn png_bytes(total_size: usize) -> Vec<u8> {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.resize(total_size.max(PNG_MAGIC.len()), 0);
    bytes
}

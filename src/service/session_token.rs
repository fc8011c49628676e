use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore};

const SESSION_ID_BYTES: usize = 32;

/// Opaque session identifier: 32 random bytes, URL-safe base64 without padding.
pub fn new_session_id() -> String {
    let mut buf = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

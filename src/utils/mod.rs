//! Small helpers shared across the crate.

use rand::RngCore;

/// Generate an opaque hex id, used for comm/goal worker diagnostics ids
/// (spec.md §4.2 step 1 `threads(CommId, GoalId)`) — not meant to be
/// parsed by clients, just compared/logged.
pub fn generate_id() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Generate a strong random password (spec.md §6 `password` option:
/// "If unset, server generates one (strong random)"). Kept as opaque
/// bytes per spec.md I4 — never converted to a `String` that might end
/// up interned anywhere.
pub fn generate_password(byte_len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill_bytes(&mut bytes);
    hex_encode(&bytes).into_bytes()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

//! Identifier generation
//!
//! Room ids are short opaque strings that peers share out of band;
//! connection ids are server-internal. Both are random hex. Collisions
//! are treated as negligible and not re-checked against live keys.

/// Length of a room id in hex characters
pub const ROOM_ID_LEN: usize = 8;

/// Length of a connection id in hex characters
pub const CONN_ID_LEN: usize = 16;

/// Generate a random room id (e.g. "3fa9c1d2")
///
/// # Panics
/// Panics if the system random number generator fails (extremely rare).
/// Use `try_generate_room_id` if you need to handle this case.
pub fn generate_room_id() -> String {
    try_generate_room_id().expect("RNG failed - system entropy source unavailable")
}

/// Try to generate a room id, returning an error if RNG fails
pub fn try_generate_room_id() -> Result<String, getrandom::Error> {
    random_hex(ROOM_ID_LEN / 2)
}

/// Generate a random connection id
///
/// # Panics
/// Panics if the system random number generator fails (extremely rare).
/// Use `try_generate_conn_id` if you need to handle this case.
pub fn generate_conn_id() -> String {
    try_generate_conn_id().expect("RNG failed - system entropy source unavailable")
}

/// Try to generate a connection id, returning an error if RNG fails
pub fn try_generate_conn_id() -> Result<String, getrandom::Error> {
    random_hex(CONN_ID_LEN / 2)
}

fn random_hex(byte_len: usize) -> Result<String, getrandom::Error> {
    let mut bytes = vec![0u8; byte_len];
    getrandom::fill(&mut bytes)?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_shape() {
        let id = generate_room_id();
        assert_eq!(id.len(), ROOM_ID_LEN);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_conn_id_shape() {
        let id = generate_conn_id();
        assert_eq!(id.len(), CONN_ID_LEN);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = generate_room_id();
        let b = generate_room_id();
        assert_ne!(a, b);

        let c = generate_conn_id();
        let d = generate_conn_id();
        assert_ne!(c, d);
    }
}

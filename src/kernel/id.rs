use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::time::Timestamp;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 8;

/// Opaque key correlating every lifecycle event of one request or connection.
/// Assigned once at open time and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(value: &str) -> Self {
        ActivityId(value.to_string())
    }
}

impl From<String> for ActivityId {
    fn from(value: String) -> Self {
        ActivityId(value)
    }
}

/// Base-36 millisecond clock followed by an 8 character random suffix.
/// Not cryptographic. Two ids minted in the same millisecond differ in the suffix.
pub fn generate_id() -> ActivityId {
    let mut id = to_base36(Timestamp::now().millis);

    let mut entropy = Uuid::new_v4().as_u128();
    for _ in 0..SUFFIX_LEN {
        id.push(ALPHABET[(entropy % 36) as usize] as char);
        entropy /= 36;
    }

    ActivityId(id)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    // Digits come from ALPHABET, always ASCII
    digits.into_iter().map(char::from).collect()
}

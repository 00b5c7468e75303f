//! Checksum hashing for dirty tracking

use rand::Rng;
use sha2::{Digest, Sha256};

use super::value::{Geometry, Timestamp};

/// SHA-256 of the given parts, each fed to the hasher in turn (no separator)
pub fn hash_strings<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// String form of a field as it contributes to a record checksum
pub trait HashInput {
    fn hash_input(&self) -> String;
}

impl HashInput for str {
    fn hash_input(&self) -> String {
        self.to_string()
    }
}

impl HashInput for String {
    fn hash_input(&self) -> String {
        self.clone()
    }
}

impl HashInput for i32 {
    fn hash_input(&self) -> String {
        self.to_string()
    }
}

impl HashInput for i64 {
    fn hash_input(&self) -> String {
        self.to_string()
    }
}

impl HashInput for f32 {
    fn hash_input(&self) -> String {
        format!("{:.6}", self)
    }
}

impl HashInput for f64 {
    fn hash_input(&self) -> String {
        format!("{:.6}", self)
    }
}

impl HashInput for bool {
    fn hash_input(&self) -> String {
        self.to_string()
    }
}

impl HashInput for Vec<u8> {
    fn hash_input(&self) -> String {
        hex::encode(self)
    }
}

impl HashInput for Timestamp {
    fn hash_input(&self) -> String {
        self.to_rfc3339()
    }
}

impl HashInput for Geometry {
    fn hash_input(&self) -> String {
        self.to_wkt()
    }
}

impl<T: HashInput> HashInput for Option<T> {
    fn hash_input(&self) -> String {
        self.as_ref().map(HashInput::hash_input).unwrap_or_default()
    }
}

/// Current UTC time
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// A random positive 32-bit id
pub fn rand_uid() -> i32 {
    rand::rng().random_range(0..99_999_999)
}

/// A unique hex id derived from the current time and a random number
pub fn unique_id() -> String {
    hash_strings([now().to_rfc3339(), rand_uid().to_string()])
}

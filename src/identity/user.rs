use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;
use uuid::Uuid;

use crate::identity::hash::fnv32a;

/// Storage key under which the user identifier is persisted.
pub const USER_ID_KEY: &str = "zen_uid";

/// Key-value persistence for the user identifier.
///
/// Implementations must treat absence and unavailability as normal
/// conditions: `get` answers `None`, `set` answers `false`, neither panics.
pub trait IdentityStore {
    fn get(&self, key: &str) -> Option<String>;
    /// Returns false when the value could not be persisted.
    fn set(&mut self, key: &str, value: &str) -> bool;
}

/// Source of random identity material. `None` means the source is
/// unavailable and the caller should degrade to the pseudo-random fallback.
pub trait RandomSource {
    fn random_u128(&self) -> Option<u128>;
}

/// OS entropy, via a v4 UUID.
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn random_u128(&self) -> Option<u128> {
        Some(Uuid::new_v4().as_u128())
    }
}

/// File-backed identity store: one value per file under a directory.
pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileIdentityStore { dir: dir.into() }
    }
}

impl IdentityStore for FileIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        let value = std::fs::read_to_string(self.dir.join(key)).ok()?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        if std::fs::create_dir_all(&self.dir).is_err() {
            return false;
        }
        std::fs::write(self.dir.join(key), value).is_ok()
    }
}

/// Load the persisted user id, or mint and persist a new one.
///
/// Entropy failure degrades to a time-seeded value, storage failure to an
/// in-memory value for the session. Both paths warn and continue; identity
/// acquisition never fails.
pub fn load_or_create_user_id(
    store: &mut dyn IdentityStore,
    random: &dyn RandomSource,
) -> String {
    if let Some(existing) = store.get(USER_ID_KEY) {
        return existing;
    }

    let user_id = match random.random_u128() {
        Some(bits) => format_uuid(bits),
        None => {
            warn!("secure random source unavailable, using time-seeded fallback id");
            format_uuid(fallback_bits())
        }
    };

    if !store.set(USER_ID_KEY, &user_id) {
        warn!("could not persist user id, continuing with in-memory value");
    }

    user_id
}

/// UUID-shaped rendering of 128 bits (8-4-4-4-12 hex groups).
fn format_uuid(bits: u128) -> String {
    let hex = format!("{:032x}", bits);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Pseudo-random fallback: wall-clock nanoseconds stretched through the FNV
/// mix, one salted word at a time. Not cryptographically strong; good enough
/// to keep distinct devices apart when the OS entropy source is missing.
fn fallback_bits() -> u128 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut bits: u128 = 0;
    for salt in 0..4u32 {
        let word = fnv32a(&format!("{}:{}", nanos, salt));
        bits = (bits << 32) | u128::from(word);
    }
    bits
}

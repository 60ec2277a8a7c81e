// User identity management.
// Format: "user_<9 base-36 chars>"

use rand::Rng;

use super::local::LocalStore;
use crate::error::StoreError;

pub(crate) const USER_ID_PREFIX: &str = "user_";
const USER_ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh opaque user identifier.
///
/// 36^9 possible suffixes: plenty for a casual multi-user setting, not meant
/// to be unguessable.
pub fn generate_user_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..USER_ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{USER_ID_PREFIX}{suffix}")
}

/// Get the identifier stored under `key`, or create and store a new one.
///
/// A blank stored value counts as absent. The generated identifier is
/// returned even when storing it fails, together with the error.
pub fn get_or_create_user_id<S, R>(
    store: &S,
    key: &str,
    rng: &mut R,
) -> (String, Option<StoreError>)
where
    S: LocalStore + ?Sized,
    R: Rng + ?Sized,
{
    let existing = match store.get(key) {
        Ok(value) => value,
        Err(e) => return (generate_user_id(rng), Some(e)),
    };

    if let Some(id) = existing.map(|v| v.trim().to_string()) {
        if !id.is_empty() {
            return (id, None);
        }
    }

    let id = generate_user_id(rng);
    let err = store.set(key, &id).err();
    (id, err)
}

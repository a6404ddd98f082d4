use serde::Serialize;

use crate::phase0::primitives::H256;

/// Content addressing for containers.
///
/// The root is SHA-256 over the `bincode` encoding of the value, which is deterministic for
/// every container in this crate.
pub trait ContentRoot: Serialize {
    fn content_root(&self) -> H256 {
        let bytes = bincode::serialize(self)
            .expect("containers consist of integers, byte arrays and sequences of known length");

        hashing::hash_bytes(bytes)
    }
}

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Profile documents (keyed by identity uid)
    pub const USERS: &str = "users";
    /// Companion dogs documents (keyed by owner uid)
    pub const DOGS: &str = "dogs";
}

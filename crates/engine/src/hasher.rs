use crate::ResultEngine;

/// Turns plain passwords into stored hashes and checks them back.
///
/// The engine never sees a concrete algorithm; the binary decides.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plain: &str) -> ResultEngine<String>;

    /// `Ok(false)` for a wrong password, `Err` only when `hash` is unreadable.
    fn verify(&self, plain: &str, hash: &str) -> ResultEngine<bool>;
}

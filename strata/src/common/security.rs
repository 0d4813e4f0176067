use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use secure_string::SecureString;

use crate::common::META_CREDENTIAL;
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::store::SchemaStore;

/// Verifies the secret a store is opened with.
///
/// An Argon2 verifier of the secret is kept in the store's metadata area. The
/// first open of a store enrolls the secret; every later open has to present
/// the same one.
///
/// # Responsibilities
///
/// * **Enrollment**: Hashes the secret with a random salt on first open
/// * **Verification**: Checks the supplied secret against the stored verifier
/// * **Error Handling**: Every rejection is an `OpenFailure` caused by a
///   `SecurityError`
pub(crate) struct CredentialService<'a, S: SchemaStore> {
    store: &'a S,
}

impl<'a, S: SchemaStore> CredentialService<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        CredentialService { store }
    }

    /// Enrolls or verifies `secret`.
    pub(crate) fn authenticate(&self, secret: &SecureString) -> StrataResult<()> {
        self.check(secret).map_err(|err| {
            StrataError::open_failure(
                &format!("Failed to open store {}: {}", self.store.store_id(), err.message()),
                err,
            )
        })
    }

    fn check(&self, secret: &SecureString) -> StrataResult<()> {
        let secret = secret.unsecure();
        if secret.is_empty() {
            log::error!("Secret is empty");
            return Err(StrataError::new("Secret is empty", ErrorKind::SecurityError));
        }

        match self.store.read_meta(META_CREDENTIAL)? {
            Some(verifier) => self.verify(secret, &verifier),
            None => self.enroll(secret),
        }
    }

    fn enroll(&self, secret: &str) -> StrataResult<()> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let verifier = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|err| {
                log::error!("Failed to hash secret: {}", err);
                StrataError::new(
                    &format!("Failed to hash secret: {}", err),
                    ErrorKind::SecurityError,
                )
            })?
            .to_string();

        self.store.write_meta(META_CREDENTIAL, &verifier)?;
        log::info!("Enrolled credential for store {}", self.store.store_id());
        Ok(())
    }

    fn verify(&self, secret: &str, verifier: &str) -> StrataResult<()> {
        let parsed = PasswordHash::new(verifier).map_err(|err| {
            log::error!("Stored credential is unreadable: {}", err);
            StrataError::new(
                &format!("Stored credential is unreadable: {}", err),
                ErrorKind::SecurityError,
            )
        })?;

        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .map_err(|_| {
                log::error!("Secret does not match for store {}", self.store.store_id());
                StrataError::new("Secret does not match", ErrorKind::SecurityError)
            })
    }
}

//! Authenticator implementations.

pub mod signing_secret;

pub use signing_secret::SigningSecretAuthenticator;

use hookrelay_core::auth::AuthenticatorSet;

/// The authenticators hookrelay ships with.
pub fn default_authenticators() -> AuthenticatorSet {
    AuthenticatorSet::new().with(SigningSecretAuthenticator::new())
}

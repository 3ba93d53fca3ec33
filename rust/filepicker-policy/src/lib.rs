#![warn(missing_docs)]

//! Security policies for the Filepicker REST API.
//!
//! A [`Policy`] describes what a caller may do (the `call`), on what
//! resource (an optional `handle`), and until when (`expiry`). Signing a
//! policy with the application secret produces a [`SignedPolicy`]: the
//! policy encoded as URL-safe base64 JSON together with a hex encoded
//! HMAC-SHA256 over that encoding. The remote service recomputes the MAC
//! from the encoded policy and its copy of the secret, so any tampering
//! with the policy invalidates the signature.
//!
//! # Example
//!
//! ```
//! use filepicker_policy::{Call, Policy, Secret};
//!
//! # fn example() -> Result<(), filepicker_policy::PolicyError> {
//! let secret = Secret::new("my-app-secret")?;
//! let policy = Policy::new().expiry(1508141504).call(Call::Read);
//!
//! let signed = policy.sign(&secret)?;
//! assert!(signed.verify(&secret));
//!
//! for (name, value) in signed.params() {
//!     println!("{name}={value}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod policy;
mod registry;
mod signature;

pub use error::PolicyError;
pub use policy::{Call, Policy};
pub use registry::{PolicyRegistry, RegisteredPolicy};
pub use signature::{Secret, Signature, SignedPolicy};

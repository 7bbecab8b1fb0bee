//! Secret Lookup
//!
//! Turns a property name into secret text:
//!
//! ```text
//! name -> Guard -> RequestBuilder -> LazyClient -> SecretsClient -> decode_payload
//! ```
//!
//! The guard runs first, so rejected names never cause configuration reads
//! for a request, client construction, or a remote call.

pub mod guard;
pub mod request;
pub mod client;
pub mod memory;
pub mod lazy;
pub mod lookup;

pub use guard::Guard;
pub use request::{
    RequestBuilder, RequestHook, RequestMode, SecretBundleByNameRequest, SecretBundleRequest,
    SecretIdFallback, Stage, VaultRequest, VersionOptions, VersionSelector,
};
pub use client::{SecretBundle, SecretPayload, SecretsClient, SecretsClientFactory};
pub use memory::MemorySecretsClient;
pub use lazy::LazyClient;
pub use lookup::{decode_payload, SecretLookup};

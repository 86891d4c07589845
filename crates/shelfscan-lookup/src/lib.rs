//! Resolution of decoded QR payloads to inventory items.
//!
//! The scanner only depends on the [`LookupClient`] trait. This crate ships
//! the HTTP implementation used against the inventory API
//! ([`HttpLookupClient`]) and a scripted one for tests
//! ([`mock::MockLookup`]).
//!
//! # Example Usage
//!
//! ```no_run
//! use shelfscan_core::ItemCode;
//! use shelfscan_lookup::{HttpLookupClient, LookupClient, LookupClientConfig, LookupResult};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpLookupClient::new(LookupClientConfig::new("http://127.0.0.1:5000/api"))?;
//!
//! match client.lookup(&ItemCode::new("INV-0a1B2c3D4e5F6g7H")?).await {
//!     LookupResult::Found(item) => println!("{} -> #{}", item.name, item.id),
//!     LookupResult::NotFound => println!("No item found for this QR code"),
//!     LookupResult::TransientError(e) => eprintln!("Lookup failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use shelfscan_core::ItemCode;

pub mod client;
pub mod error;
pub mod mock;
pub mod result;

pub use client::{HttpLookupClient, LookupClientConfig};
pub use error::LookupError;
pub use result::LookupResult;

/// Resolves item codes.
///
/// Lookups never fail at the type level: every failure is folded into
/// [`LookupResult::TransientError`].
///
/// # Object Safety
///
/// **NOTE**: Not object-safe (`lookup` returns `impl Future`). Use a generic
/// parameter.
pub trait LookupClient: Send + Sync + 'static {
    fn lookup(&self, code: &ItemCode) -> impl Future<Output = LookupResult> + Send;
}

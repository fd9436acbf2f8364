//! Storefront-local models.
//!
//! Domain types live in `stockyard-core`; this module holds what only the
//! storefront needs, such as the layout of session data.

pub mod session;

pub use session::keys as session_keys;

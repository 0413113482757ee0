//! Local Node State
//!
//! State owned exclusively by this node process: the durably cached
//! self address.

pub mod address;

pub use address::SelfAddressCache;

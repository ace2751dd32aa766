//! Service layer
//!
//! Operation entry points consumed by the external tool layer. Each
//! operation returns a serializable report and resolves remote
//! credentials fresh on every call.

pub mod status;
pub mod sync;

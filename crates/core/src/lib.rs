//! Pure domain logic for the geoclock attendance enforcer.
//!
//! Everything in this crate is I/O-free: working-area geometry, the
//! location validator, attendance documents and their reducers, and
//! timezone-aware hour formatting. Store access and the control loops
//! live in `geoclock_store` and `geoclock_bot`.

pub mod attendance;
pub mod clockout;
pub mod employee;
pub mod error;
pub mod geo;
pub mod location;
pub mod timefmt;
pub mod types;
pub mod validator;

pub use error::{CoreError, CoreResult};
pub use types::Timestamp;

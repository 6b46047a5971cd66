//! Infrastructure layer: the collaborators the state machines talk to.
//!
//! Record storage, the hospital data source and configuration loading. Each
//! collaborator sits behind a trait so tests can swap in an in-memory fake.

pub mod config;
pub mod hospitals;
pub mod persistence;

pub use config::*;
pub use hospitals::*;
pub use persistence::*;

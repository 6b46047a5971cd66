//! Application layer: page composition on top of the domain state machines.
//!
//! The wizard and search-map page own their timers and talk to the record
//! store and hospital source; [`App`] routes between screens.

pub mod search;
pub mod session;
pub mod state;
pub mod timers;
pub mod wizard;

pub use search::*;
pub use session::*;
pub use state::*;
pub use timers::*;
pub use wizard::*;

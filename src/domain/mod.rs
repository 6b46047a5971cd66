//! Domain layer: the interactive state machines and the entities they act on.
//!
//! Nothing in here performs I/O. Sheets, selection and onboarding forms are
//! plain values mutated by discrete input events.

pub mod errors;
pub mod forms;
pub mod gesture;
pub mod models;
pub mod onboarding;
pub mod rows;
pub mod selection;
pub mod validation;

pub use errors::*;
pub use forms::*;
pub use gesture::*;
pub use models::*;
pub use onboarding::*;
pub use rows::*;
pub use selection::*;
pub use validation::*;

pub mod actor;
pub use actor::*;

pub mod agent;
pub use agent::*;

pub mod trajectory;
pub use trajectory::*;

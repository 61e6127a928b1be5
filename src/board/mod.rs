pub mod aggregate;
pub use aggregate::*;

pub mod colour;
pub use colour::*;

pub mod pawn;
pub use pawn::*;

pub mod position;
pub use position::*;

pub mod roll;
pub use roll::*;

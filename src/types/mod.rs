pub mod bar;
pub mod frame;

pub use bar::*;
pub use frame::*;

pub mod grid;
pub mod session;
pub mod sheet;

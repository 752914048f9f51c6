pub mod cli;
pub mod config;
pub mod editor;
pub mod io;
pub mod network;
pub mod provision;
pub mod state;

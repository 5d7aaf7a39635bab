pub mod command;
pub mod filters;
pub mod info;
pub mod process;
pub mod profile;
pub mod progress;

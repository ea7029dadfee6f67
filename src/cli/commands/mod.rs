pub mod ask;
pub mod config;
pub mod providers;
pub mod route;

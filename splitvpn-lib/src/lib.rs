pub mod batch;
pub mod config;
pub mod dirs;
pub mod logging;
pub mod manager;
pub mod models;
pub mod networksetup;
pub mod repository;
pub mod route_sync;
pub mod shell_command_ext;
pub mod storage;

mod mocks;

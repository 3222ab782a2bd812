pub mod browser;
pub mod config;
pub mod network;
pub mod storage;

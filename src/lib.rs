// We have to use crate:: to reach our config
// module because of the "config" dependency.
pub mod config;
pub mod db;
pub mod app;
pub mod redaction;
pub mod reader;
pub mod utils;

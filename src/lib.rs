pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logs;
pub mod response;
pub mod state;
pub mod tasks;
pub mod web;

#[cfg(test)]
mod memory;
#[cfg(test)]
mod test_support;

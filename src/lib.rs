pub mod api;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod output;
pub mod panels;
pub mod session;

#[cfg(test)]
mod tests;

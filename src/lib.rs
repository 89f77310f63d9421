pub mod action;
pub mod config;
pub mod error;
pub mod format;
pub mod metadata;
pub mod movie;
pub mod overrides;
pub mod reconcile;
pub mod sorter;
pub mod tokenize;
pub mod tv;
pub mod video;

#[cfg(test)]
mod testing;

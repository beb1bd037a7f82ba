pub mod clear;
pub mod collect;
pub mod config;

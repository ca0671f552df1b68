#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

pub mod core;
pub mod export;
pub mod prelude;
pub mod quantity;
pub mod scenario;
pub mod statistics;
pub mod tables;

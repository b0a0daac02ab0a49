// src/core/mod.rs

pub mod history;
pub mod prompts;
pub mod reflection;
pub mod transcript;
pub mod types;

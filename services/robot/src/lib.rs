pub mod config;
pub mod console;
pub mod offline;
pub mod prompts;
pub mod scene;

pub mod memory;
pub mod provider;
pub mod search;
pub mod types;

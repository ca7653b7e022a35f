pub mod snapshot;
pub mod team;

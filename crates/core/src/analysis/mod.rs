pub mod analyzer;
pub mod correlation;
pub mod risk;
pub mod team;

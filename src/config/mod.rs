/// Database configuration and connection management
pub mod database;

/// Budget and category seeding from a TOML file
pub mod seed;

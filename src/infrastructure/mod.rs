// Infrastructure layer module
// Contains storage adapters and default data
// Follows Hexagonal Architecture

pub mod repositories;
pub mod seed;

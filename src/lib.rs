pub mod build;
pub mod colors;
pub mod common;
pub mod enrich;
pub mod export;
pub mod filter;
pub mod generate_commands;
pub mod graph;
pub mod grouping;
pub mod identity;
pub mod layout;
pub mod model;
pub mod node;
pub mod plan;
pub mod plan_execution;
pub mod relations;
pub mod snapshot;

pub mod checkpoint;
pub mod config;
pub mod contexts;
pub mod data;
pub mod providers;
pub mod registries;

pub mod error;
pub mod routes;
pub mod settings;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;
pub mod verification;

#[cfg(test)]
mod testing;

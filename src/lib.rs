pub mod bibtex;
pub mod citations;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod utils;

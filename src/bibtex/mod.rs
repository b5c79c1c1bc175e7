pub mod import;
pub mod latex;
pub mod mapper;
pub mod parser;

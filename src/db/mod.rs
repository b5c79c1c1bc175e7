pub mod admin_repository;
pub mod attachment_repository;
pub mod citation_repository;
pub mod publication_repository;
pub mod schema;
pub mod type_repository;

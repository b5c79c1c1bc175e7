pub mod admin;
pub mod attachment;
pub mod citation;
pub mod publication;
pub mod publication_type;
pub mod response;

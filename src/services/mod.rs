pub mod quota;
pub mod upload_service;

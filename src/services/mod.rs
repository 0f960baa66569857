pub mod attachment_service;
pub mod classification_service;
pub mod comment_service;
pub mod entity_fetcher;
pub mod operation_store;

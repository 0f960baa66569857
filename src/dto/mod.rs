pub mod attachment_dto;
pub mod classification_dto;
pub mod comment_dto;
pub mod operation_log_dto;
pub mod target_dto;

pub mod attachment;
pub mod classification;
pub mod comment;
pub mod operation_record;
pub mod universal_state;

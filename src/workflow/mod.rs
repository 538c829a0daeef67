pub mod file_upload;
pub mod fill_ctx;
pub mod form_fill;

pub use file_upload::{decode_resume_payload, FileUploadCoordinator};
pub use fill_ctx::FieldCtx;
pub use form_fill::FormFillCoordinator;

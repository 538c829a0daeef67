pub mod fill_result;
pub mod loaders;
pub mod platform;
pub mod posting;
pub mod profile;
pub mod tracking;
pub mod upload;
pub mod value_transform;

pub use fill_result::{FieldOutcome, FieldReport, FormFillResult, SkipReason};
pub use loaders::{load_json_payload, load_registry};
pub use platform::{
    Action, ActionStep, FieldConfig, FillMethod, KeyEventOptions, LocatorSpec, MouseEventKind,
    PlatformConfig, PlatformRegistry, UploadConfig,
};
pub use posting::JobPosting;
pub use profile::{
    ExperienceEntry, FieldValue, ResumeFilePayload, StoredProfile, StoredResume, TailoredProfile,
};
pub use tracking::{FailureEvent, TrackingEvent};
pub use upload::{ResumeFile, UploadOutcome};

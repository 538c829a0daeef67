pub mod action_executor;
pub mod element_locator;
pub mod page_extractor;
pub mod platform_detector;
pub mod profile_tailor;

pub use action_executor::{ActionExecutor, SequenceOutcome, SequenceScope};
pub use element_locator::{ElementLocator, Found};
pub use page_extractor::PageDataExtractor;
pub use platform_detector::PlatformDetector;
pub use profile_tailor::{extract_keywords, extract_years_of_experience, ProfileTailor};

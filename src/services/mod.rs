pub mod attempt_session;
pub mod autosave_service;
pub mod draft_service;
pub mod result_service;
pub mod scoring_service;

pub use attempt_session::{AttemptProgress, AttemptSession};
pub use autosave_service::{AutosaveEngine, AutosaveOptions, AutosaveSnapshot, AutosaveStatus};
pub use draft_service::DraftService;
pub use result_service::ResultService;
pub use scoring_service::ScoringService;

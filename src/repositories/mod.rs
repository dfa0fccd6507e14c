pub mod draft_repository;
pub mod exam_repository;
pub mod http_draft_repository;

pub use draft_repository::{DraftRepository, MongoDraftRepository};
pub use exam_repository::{ExamRepository, MongoExamRepository};
pub use http_draft_repository::HttpDraftRepository;

#[cfg(test)]
pub use draft_repository::MockDraftRepository;
#[cfg(test)]
pub use exam_repository::MockExamRepository;

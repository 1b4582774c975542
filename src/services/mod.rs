pub mod ai_service;
pub mod document_service;
pub mod grading_service;
pub mod queue_service;
pub mod report_service;
pub mod submission_service;
pub mod test_service;

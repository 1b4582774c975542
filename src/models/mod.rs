pub mod answer;
pub mod document;
pub mod grading;
pub mod job;
pub mod question;
pub mod submission;

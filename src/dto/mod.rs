pub mod job_dto;
pub mod test_dto;

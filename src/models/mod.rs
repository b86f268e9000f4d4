pub mod applicant;
pub mod extraction;
pub mod intake;
pub mod job;
pub mod notification;
pub mod statement;

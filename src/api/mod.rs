pub mod rank;
pub mod register;
pub mod submission;
pub mod task;

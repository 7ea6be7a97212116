pub mod application;
pub mod credit;
pub mod job;
pub mod user;

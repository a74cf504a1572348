pub mod file;
pub mod retry;

pub mod guest;
pub mod ssh;
pub mod workflow;

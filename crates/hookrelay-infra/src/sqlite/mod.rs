pub mod credential;
pub mod event;
pub mod execution;
pub mod pool;
pub mod workflow;

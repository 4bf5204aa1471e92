pub mod allocator;
pub mod availability;
pub mod coordinator;
pub mod lock;
pub mod pricing;

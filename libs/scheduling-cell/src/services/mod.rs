pub mod availability;
pub mod bulk;
pub mod lifecycle;
pub mod schedule;
pub mod slots;

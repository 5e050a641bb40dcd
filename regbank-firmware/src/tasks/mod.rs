//! Embassy async tasks

pub mod analog;
pub mod register;

pub use analog::analog_task;
pub use register::register_task;

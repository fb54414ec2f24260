//! Request and response bodies

pub mod order;

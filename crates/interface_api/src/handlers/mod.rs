//! Request handlers

pub mod health;
pub mod orders;
pub mod student_products;

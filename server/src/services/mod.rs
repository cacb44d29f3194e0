// pizzeria/src/services/mod.rs

pub mod auth_service;
pub mod order_service;
pub mod seed;
pub mod token_service;

pub mod catalog;
pub mod service;
pub mod stage_order;
pub mod views;

//! HTTP Routes

pub mod sensors;

//! Patterns sub-module: observable, observable_value, lazy_object.

pub mod lazy_object;
pub mod observable;
pub mod observable_value;

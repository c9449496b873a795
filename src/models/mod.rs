pub mod datetime_utils;
mod delegation;

pub use delegation::{Delegation, DelegationQuery};

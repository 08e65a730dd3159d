pub mod community;
pub mod payment;
pub mod user;

pub mod health;
pub mod resolve;
pub mod tunnel;

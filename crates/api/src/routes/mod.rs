pub mod user;
pub mod ws;

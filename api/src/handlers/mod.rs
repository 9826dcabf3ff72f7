pub mod health;
pub mod permissions;
pub mod players;
pub mod session;

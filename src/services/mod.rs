pub mod cookies;
pub mod error;
pub mod password;
pub mod publish;
pub mod session;

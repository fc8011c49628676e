pub mod password;
pub mod session_token;
pub mod store_actor;

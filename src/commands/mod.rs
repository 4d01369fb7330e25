pub mod configure;
pub mod password;
pub mod show;

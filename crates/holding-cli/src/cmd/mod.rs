pub mod init;
pub mod project;
pub mod seed;
pub mod serve;
pub mod user;

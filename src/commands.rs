pub mod build;
pub mod clean;
pub mod init;
pub mod render;
pub mod serve;

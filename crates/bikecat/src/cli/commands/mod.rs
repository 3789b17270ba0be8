pub mod init;
pub mod schema;
pub mod sql;
pub mod tools;

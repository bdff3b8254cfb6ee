pub mod db;
pub mod init;
pub mod once;
pub mod run;
pub mod status;

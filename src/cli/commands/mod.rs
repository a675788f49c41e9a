pub mod accounts;
pub mod cleanup;
pub mod completions;
pub mod config;
pub mod login;
pub mod logout;
pub mod sessions;
pub mod whoami;

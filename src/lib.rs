pub mod acs;
pub mod cli;
pub mod config;
pub mod consts;
pub mod credentials;
pub mod descriptor;
pub mod download;
pub mod engine;
pub mod fc_client;
pub mod locks;
pub mod main_actions;
pub mod operator;
pub mod request;
pub mod server;
pub mod sts_client;
pub mod workspace;

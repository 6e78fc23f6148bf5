pub mod config;
pub mod detect;
pub mod login;
pub mod naming;
pub mod observer;
pub mod orchestrator;
pub mod paths;
pub mod session;
pub mod target;
pub mod unpack;

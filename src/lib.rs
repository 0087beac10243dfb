pub mod arguments;
pub mod config;
pub mod errors;
pub mod logger;
pub mod push;
pub mod run;
pub mod scheduler;
pub mod shutdown;
pub mod webserver;

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod prompts;
pub mod state;
pub mod upstream;

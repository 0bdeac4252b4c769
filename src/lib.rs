pub mod args;
pub mod clock;
pub mod es;
pub mod filter;
pub mod logging;
pub mod runner;

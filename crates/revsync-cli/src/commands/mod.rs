pub mod common;
pub mod deactivate;
pub mod list;
pub mod run;
pub mod settings;
pub mod sync;

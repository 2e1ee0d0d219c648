//! One module per CLI subcommand.

pub mod biometric;
pub mod change_password;
pub mod delete;
pub mod delete_all;
pub mod generate;
pub mod get;
pub mod list;
pub mod lock;
pub mod set;
pub mod status;
pub mod unlock_mode;

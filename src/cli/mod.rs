pub mod args;
pub mod commands;
pub mod output;

pub use args::{
    AccountArgs, Cli, Commands, InvokeArgs, PayArgs, SmokeArgs, TxArgs, Verbosity,
};

//! Oracle reporter and end-block resolution CLI.

use clap::Parser;
use zoracled::{Cli, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_thread_panic_hook();
    Cli::parse().run().await.inspect_err(|e| eprintln!("{e}"))
}

/// Sets thread panic hook, useful for having tests that panic.
fn set_thread_panic_hook() {
    use std::{
        backtrace::Backtrace,
        panic::{set_hook, take_hook},
        process::exit,
    };
    let orig_hook = take_hook();
    set_hook(Box::new(move |panic_info| {
        eprintln!("Custom backtrace: {}", Backtrace::capture());
        orig_hook(panic_info);
        exit(1);
    }));
}

//! homedash CLI - headless dashboard client
//!
//! # Usage
//!
//! ```bash
//! cargo build --features cli --bin homedash-cli
//!
//! # Log in (password may come from $HOMEDASH_PASSWORD)
//! ./target/debug/homedash-cli login -u ada
//!
//! # Follow all widgets until Ctrl-C
//! ./target/debug/homedash-cli watch
//!
//! # JSON lines for scripting
//! ./target/debug/homedash-cli watch --once --json | jq .
//!
//! # Shopping list
//! ./target/debug/homedash-cli list add "oat milk"
//! ```

use anyhow::Result;
use clap::Parser;

use homedash_lib::cli::{execute, initialize, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let ctx = initialize(&args).await?;
    let result = execute(&ctx).await;
    ctx.shutdown();

    result
}

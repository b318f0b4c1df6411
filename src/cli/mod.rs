//! Command-line interface for Tradesdesk.

use clap::{Parser, Subcommand};

/// Tradesdesk - identity and onboarding service for the professional marketplace
#[derive(Parser)]
#[command(name = "tradesdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API until Ctrl+C (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Print the role catalog
    Roles,
}

/// Prints the catalog as an aligned table.
pub fn print_roles() {
    println!("{:<22} {:<14} {}", "KEY", "CATEGORY", "SUB-CATEGORY");
    println!("{:-<60}", "");
    for role in &crate::roles::ROLES {
        println!("{:<22} {:<14} {}", role.key, role.category, role.sub_category);
    }
}

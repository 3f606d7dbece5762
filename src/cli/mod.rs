//! CLI module - Command-line interface for firstrun
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants;

/// firstrun - first-run bootstrap for the cafe store
/// Seeds the administrator account and default settings exactly once
#[derive(Parser)]
#[command(name = "firstrun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the usual lookup locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seed the admin account and default settings if no admin exists
    #[command(alias = "init")]
    Bootstrap {
        /// Store file (defaults to the configured or platform location)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Initial admin password
        #[arg(long, env = constants::env::ADMIN_PASSWORD, hide_env_values = true)]
        password: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report admin count and settings without modifying the store
    #[command(alias = "c")]
    Check {
        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Check a login and password against the stored admin account
    Verify {
        #[arg(long)]
        db: Option<PathBuf>,

        /// Admin login name
        #[arg(long, default_value = constants::seed::ADMIN_LOGIN_NAME)]
        login: String,

        #[arg(long, env = constants::env::ADMIN_PASSWORD, hide_env_values = true)]
        password: String,
    },

    /// Print the resolved store location
    Path,

    /// Write a default config.toml if none exists
    InitConfig {
        /// Where to write it
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

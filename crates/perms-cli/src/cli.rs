use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "perms",
    about = "Manage field permissions in Salesforce permission sets",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Grant or change field permissions
    #[command(subcommand)]
    Field(FieldCommand),
    /// Inspect permission sets
    #[command(subcommand)]
    PermissionSet(PermissionSetCommand),
}

#[derive(Subcommand)]
pub enum FieldCommand {
    /// Set field access levels in one or more permission sets
    New(FieldNewArgs),
    /// List the fields of an object
    List(FieldListArgs),
}

#[derive(Subcommand)]
pub enum PermissionSetCommand {
    /// List the permission sets of the project
    List(PermissionSetListArgs),
}

/// Where the project's metadata lives.
#[derive(Args, Clone, Debug, Default)]
pub struct LayoutArgs {
    /// Base metadata directory [default: force-app/main/default]
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,
    /// Permission set directory [default: <directory>/permissionsets]
    #[arg(long)]
    pub permission_set_directory: Option<PathBuf>,
    /// Object directory [default: <directory>/objects]
    #[arg(long)]
    pub object_directory: Option<PathBuf>,
    /// Config file [default: ./.perms.toml if present]
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct FieldNewArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// Permission set title or file name (repeatable)
    #[arg(
        short = 'p',
        long = "permission-set",
        required_unless_present = "all_permission_sets"
    )]
    pub permission_sets: Vec<String>,
    /// Apply to every permission set in the project
    #[arg(long, conflicts_with = "permission_sets")]
    pub all_permission_sets: bool,
    /// Object the fields belong to
    #[arg(short, long)]
    pub object: String,
    /// FIELD=LEVEL, where LEVEL is none, read or read_edit (repeatable)
    #[arg(short, long = "field", value_parser = parse_field_level, required = true)]
    pub fields: Vec<(String, String)>,
    /// Show the changes without writing any file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct FieldListArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
    #[arg(short, long)]
    pub object: String,
}

#[derive(Args)]
pub struct PermissionSetListArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
}

/// Split `FIELD=LEVEL`. The level itself is checked when the selection is
/// built.
fn parse_field_level(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, level)) if !field.trim().is_empty() && !level.trim().is_empty() => {
            Ok((field.trim().to_string(), level.trim().to_string()))
        }
        _ => Err(format!("expected FIELD=LEVEL, got {raw:?}")),
    }
}

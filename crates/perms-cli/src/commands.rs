use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use perms_diff::DocumentPreview;
use perms_store::{ConfigOverrides, FsDocumentStore, PermsConfig, ProjectCatalog};
use perms_updater::{BatchReport, BatchUpdater, Status, UpdateMode, UpdateSummary};
use serde_json::json;

use crate::cli::{
    Cli, Command, FieldCommand, FieldListArgs, FieldNewArgs, LayoutArgs, OutputFormat,
    PermissionSetCommand, PermissionSetListArgs,
};
use crate::selection::{FlagSelection, Targets};

/// Run one command. Returns `false` when the command ran but failed.
pub async fn run_command(cli: Cli) -> anyhow::Result<bool> {
    let format = cli.format;
    match cli.command {
        Command::Field(FieldCommand::New(args)) => cmd_field_new(args, format).await,
        Command::Field(FieldCommand::List(args)) => cmd_field_list(args, format),
        Command::PermissionSet(PermissionSetCommand::List(args)) => {
            cmd_permission_set_list(args, format)
        }
    }
}

fn resolve_config(layout: &LayoutArgs) -> anyhow::Result<PermsConfig> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let overrides = ConfigOverrides {
        base_directory: layout.directory.clone(),
        permission_directory: layout.permission_set_directory.clone(),
        object_directory: layout.object_directory.clone(),
    };
    Ok(PermsConfig::discover(layout.config.as_deref(), &cwd)?.with_overrides(&overrides)?)
}

async fn cmd_field_new(args: FieldNewArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let config = resolve_config(&args.layout)?;
    let targets = if args.all_permission_sets {
        Targets::All
    } else {
        Targets::Named(args.permission_sets)
    };
    let provider = FlagSelection::new(
        ProjectCatalog::from_config(&config),
        targets,
        args.object,
        args.fields,
    );
    let store = Arc::new(FsDocumentStore::new(config.permission_directory()));
    let mode = if args.dry_run {
        UpdateMode::DryRun
    } else {
        UpdateMode::Write
    };
    let updater = BatchUpdater::new(store, Box::new(provider)).with_mode(mode);

    match updater.run().await {
        Ok(report) => {
            print_report(&report, mode, format)?;
            Ok(report.is_success())
        }
        Err(err) => {
            let summary = UpdateSummary {
                success: false,
                error_message: Some(err.to_string()),
                documents: Vec::new(),
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => eprintln!("{} {}", "✗".red().bold(), err),
            }
            Ok(false)
        }
    }
}

fn print_report(report: &BatchReport, mode: UpdateMode, format: OutputFormat) -> anyhow::Result<()> {
    let summary = report.result();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for doc in &summary.documents {
        let title = doc.id.title();
        match doc.status {
            Status::Updated => println!(
                "{} {}: {} added, {} changed",
                "✓".green(),
                title.bold(),
                doc.inserted,
                doc.updated
            ),
            Status::Unchanged => println!("{} {}: {}", "✓".green(), title.bold(), "unchanged".dimmed()),
            Status::Failed => println!(
                "{} {}: {}",
                "✗".red(),
                title.bold(),
                doc.error.as_deref().unwrap_or_default().red()
            ),
        }
    }
    if mode == UpdateMode::DryRun {
        for preview in report.outcomes.iter().filter_map(|o| o.preview.as_ref()) {
            print_preview(preview);
        }
        println!("{}", "Dry run: no files were written.".yellow());
    }
    if let Some(message) = &summary.error_message {
        eprintln!("{} {}", "✗".red().bold(), message);
    }
    Ok(())
}

fn print_preview(preview: &DocumentPreview) {
    for line in preview.unified().lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}

fn cmd_field_list(args: FieldListArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let config = resolve_config(&args.layout)?;
    let catalog = ProjectCatalog::from_config(&config);
    let fields = catalog
        .fields(&args.object)
        .with_context(|| format!("cannot list fields of {}", args.object))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&fields)?),
        OutputFormat::Text => {
            println!("Fields of {}:", args.object.bold());
            for field in &fields {
                println!("  {field}");
            }
        }
    }
    Ok(true)
}

fn cmd_permission_set_list(args: PermissionSetListArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let config = resolve_config(&args.layout)?;
    let sets = ProjectCatalog::from_config(&config)
        .permission_sets()
        .context("cannot list permission sets")?;
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = sets
                .iter()
                .map(|id| json!({ "title": id.title(), "file": id.as_str() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            for id in &sets {
                println!("{}  {}", id.title().yellow(), id.as_str().dimmed());
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::path::Path;

    const FIRST: &str = "FirstPermissionSet.permissionset-meta.xml";

    const FIRST_SET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<PermissionSet xmlns="http://soap.sforce.com/2006/04/metadata">
    <description>First</description>
    <hasActivationRequired>false</hasActivationRequired>
    <label>First Permission Set</label>
</PermissionSet>
"#;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let perms = dir.path().join("permissionsets");
        let fields = dir.path().join("objects/Account/fields");
        fs::create_dir_all(&perms).unwrap();
        fs::create_dir_all(&fields).unwrap();
        fs::write(perms.join(FIRST), FIRST_SET).unwrap();
        for field in ["Address__c", "AddressString__c"] {
            fs::write(fields.join(format!("{field}.field-meta.xml")), "").unwrap();
        }
        dir
    }

    async fn run(base: &Path, extra: &[&str]) -> bool {
        let base = base.to_str().unwrap();
        let mut argv = vec!["perms", "field", "new", "-d", base, "-p", "FirstPermissionSet", "-o", "Account"];
        argv.extend_from_slice(extra);
        run_command(Cli::try_parse_from(argv).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn field_new_updates_file() {
        let dir = project();
        let ok = run(dir.path(), &["-f", "Address__c=read", "-f", "AddressString__c=read_edit"]).await;
        assert!(ok);
        let text = fs::read_to_string(dir.path().join("permissionsets").join(FIRST)).unwrap();
        assert!(text.contains("<field>Account.AddressString__c</field>"));
        assert!(text.contains("<field>Account.Address__c</field>"));
        let first = text.find("AddressString__c").unwrap();
        assert!(first < text.find("Account.Address__c").unwrap());
    }

    #[tokio::test]
    async fn dry_run_leaves_file() {
        let dir = project();
        assert!(run(dir.path(), &["-f", "Address__c=read", "--dry-run"]).await);
        let text = fs::read_to_string(dir.path().join("permissionsets").join(FIRST)).unwrap();
        assert_eq!(text, FIRST_SET);
    }

    #[tokio::test]
    async fn invalid_level_fails_without_writing() {
        let dir = project();
        assert!(!run(dir.path(), &["-f", "Address__c=archived"]).await);
        let text = fs::read_to_string(dir.path().join("permissionsets").join(FIRST)).unwrap();
        assert_eq!(text, FIRST_SET);
    }

    #[tokio::test]
    async fn repeated_field_fails_without_writing() {
        let dir = project();
        assert!(!run(dir.path(), &["-f", "Address__c=read", "-f", "Address__c=read_edit"]).await);
        let text = fs::read_to_string(dir.path().join("permissionsets").join(FIRST)).unwrap();
        assert_eq!(text, FIRST_SET);
    }

    #[tokio::test]
    async fn conflicting_layout_is_an_error() {
        let dir = project();
        let base = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "perms", "field", "new", "-d", base,
            "--permission-set-directory", base, "--object-directory", base,
            "-p", "FirstPermissionSet", "-o", "Account", "-f", "Address__c=read",
        ])
        .unwrap();
        assert!(run_command(cli).await.is_err());
    }

    #[tokio::test]
    async fn list_commands_succeed() {
        let dir = project();
        let base = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["perms", "field", "list", "-d", base, "-o", "Account"]).unwrap();
        assert!(run_command(cli).await.unwrap());
        let cli =
            Cli::try_parse_from(["perms", "permission-set", "list", "-d", base, "--format", "json"]).unwrap();
        assert!(run_command(cli).await.unwrap());
    }
}

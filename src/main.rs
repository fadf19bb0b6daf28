use std::sync::Arc;

use clap::Parser;

use isorepo_cli::error::Error;
use isorepo_cli::{install, ClientContext, CommandArgs, Config, Outcome, Result, Section};

#[derive(Parser)]
#[command(name = "isorepo")]
#[command(about = "Manage ISO content repositories on a remote content server")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Command path followed by its options, e.g. `iso repo list --details`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    path: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    isorepo_cli::logging::init_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_deref())?;
    let ctx = Arc::new(ClientContext::from_config(config).map_err(Error::Client)?);

    // The host owns the top-level root; the plugin installs its subtree into it.
    let mut root = Section::new("root", "isorepo command line").map_err(Error::Registry)?;
    install(&ctx, &mut root).map_err(Error::Registry)?;

    dispatch(&root, &cli.path).await
}

/// Walk the section tree along `tokens`, then run the named command with the
/// remaining tokens as its arguments.
async fn dispatch(root: &Section, tokens: &[String]) -> Result<()> {
    let mut section = root;
    let mut index = 0;
    while index < tokens.len() {
        match section.find_section(&tokens[index]) {
            Some(next) => {
                section = next;
                index += 1;
            }
            None => break,
        }
    }

    let name = match tokens.get(index) {
        Some(name) => name,
        None => {
            print_help(section);
            return Ok(());
        }
    };

    let command = match section.command(name) {
        Some(command) => command,
        None => {
            print_help(section);
            return Err(Error::Internal(anyhow::anyhow!(
                "unknown command '{}'",
                name
            )));
        }
    };

    let args = CommandArgs::parse_tokens(&tokens[index + 1..]);
    match command.execute(&args).await.map_err(Error::Command)? {
        Outcome::Done => {}
        Outcome::Message(message) => println!("{}", message),
        Outcome::Records(records) => {
            for record in records {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&record)
                        .map_err(|e| Error::Internal(e.into()))?
                );
            }
        }
    }

    Ok(())
}

fn print_help(section: &Section) {
    if section.subsections().next().is_some() {
        println!("Sections:");
        for subsection in section.subsections() {
            println!("  {:<12} {}", subsection.name(), subsection.description());
        }
    }
    if section.commands().next().is_some() {
        println!("Commands:");
        for command in section.commands() {
            println!("  {:<12} {}", command.name(), command.description());
        }
    }
}

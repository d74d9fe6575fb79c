//! CLI interface for learning-log

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config::{self, Config};
use crate::dispatch;
use crate::scheduler::DigestOutcome;
use crate::server;

#[derive(Parser)]
#[command(name = "learning-log")]
#[command(about = "English phrase and correction log with review ranking and daily digests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind (default from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Also run the scheduled daily digest
        #[arg(long)]
        with_digest: bool,
    },
    /// Run one tool locally and print the JSON result
    Call {
        /// Tool name, e.g. save_phrase
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
        /// User id (overrides the configured default)
        #[arg(short, long, env = "DEFAULT_USER_ID")]
        user: Option<String>,
    },
    /// List available tools
    Tools,
    /// Build today's summary and push it
    Digest {
        /// Print the message without sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show or reset configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Overwrite the config file with defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, with_digest } => {
            let config = Config::load()?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            server::start(config, &host, port, with_digest).await?;
        }
        Commands::Call { tool, args, user } => {
            let config = Config::load()?;
            let arguments = parse_arguments(args.as_deref(), user.as_deref())?;

            let log = server::open_log(&config).await?;
            let result = dispatch::handle_tool_call(&log, &tool, &arguments, &config.default_user_id()).await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            if result["success"] != Value::Bool(true) {
                std::process::exit(1);
            }
        }
        Commands::Tools => {
            for tool in dispatch::tool_catalog() {
                println!("{:<22} {}", tool.name, tool.description);
            }
        }
        Commands::Digest { dry_run } => {
            let config = Config::load()?;
            let log = server::open_log(&config).await?;
            let job = server::digest_job(&config, log)?;

            match job.run(dry_run).await? {
                DigestOutcome::DryRun { message } => println!("{}", message),
                DigestOutcome::Sent { recipient, .. } => println!("Digest sent to {}", recipient),
            }
        }
        Commands::Config { show, reset } => {
            if reset {
                config::reset_config()?;
            } else if show {
                config::show_config()?;
            } else {
                println!("Config file: {}", config::config_path()?.display());
                println!("Use --show to print settings or --reset to restore defaults.");
            }
        }
    }

    Ok(())
}

/// Parse `--args` into an object and fold `--user` into it
fn parse_arguments(args: Option<&str>, user: Option<&str>) -> Result<Value> {
    let mut arguments: Value = match args {
        Some(raw) => serde_json::from_str(raw).context("--args must be valid JSON")?,
        None => Value::Object(Default::default()),
    };

    if let Some(user) = user {
        let map = arguments
            .as_object_mut()
            .context("--args must be a JSON object")?;
        map.insert("user_id".to_string(), Value::String(user.to_string()));
    }

    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["learning-log", "serve", "--port", "9000", "--with-digest"]).unwrap();
        match cli.command {
            Commands::Serve { host, port, with_digest } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
                assert!(with_digest);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_arguments() {
        let args = parse_arguments(Some(r#"{"keyword": "ice"}"#), Some("alice")).unwrap();
        assert_eq!(args["keyword"], "ice");
        assert_eq!(args["user_id"], "alice");

        let args = parse_arguments(None, None).unwrap();
        assert!(args.as_object().unwrap().is_empty());

        assert!(parse_arguments(Some("[1, 2]"), Some("alice")).is_err());
        assert!(parse_arguments(Some("{bad"), None).is_err());
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};

use trafficdash::{cli, client, config, logging, web};

#[derive(Debug, Parser)]
#[command(name = "trafficdash")]
#[command(about = "Control center for the SD-WAN traffic generator")]
struct App {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the dashboard and JSON API (default)
    Serve {
        /// Listening port (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Listening address
        #[arg(long)]
        bind: Option<String>,
        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Poll a running dashboard and draw it in the terminal
    Watch {
        /// Dashboard base URL (default: http://127.0.0.1:<port>)
        #[arg(long)]
        url: Option<String>,
    },
    /// Show whether the generator service is running
    Status {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Inspect or edit application weights
    Apps {
        #[command(subcommand)]
        action: AppsAction,
    },
    /// Inspect or replace the network interface list
    Interfaces {
        #[command(subcommand)]
        action: InterfacesAction,
    },
    /// Dashboard configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum AppsAction {
    /// List all application rules
    List {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Set the weight of every rule for a domain
    Set { domain: String, weight: u64 },
}

#[derive(Debug, Subcommand)]
enum InterfacesAction {
    /// List configured interfaces
    List {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Replace the whole list (no arguments writes an empty file)
    Set { interfaces: Vec<String> },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.trafficdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let app = App::parse();
    let mut cfg = config::load();
    logging::init(&cfg.logging.level);

    let command = app.command.unwrap_or(Commands::Serve {
        port: None,
        bind: None,
        open: false,
    });

    match command {
        Commands::Serve { port, bind, open } => {
            if let Some(port) = port {
                cfg.server.port = port;
            }
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            cfg.server.open_browser |= open;
            web::serve(&cfg)
        }
        Commands::Watch { url } => {
            let url = url.unwrap_or_else(|| format!("http://127.0.0.1:{}", cfg.server.port));
            client::watch(&cfg, &url)
        }
        Commands::Status { format } => {
            cli::run_status(&cfg, cli::OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Apps { action } => match action {
            AppsAction::List { format } => {
                cli::run_apps_list(&cfg, cli::OutputFormat::from_str_opt(Some(&format)))
            }
            AppsAction::Set { domain, weight } => cli::run_apps_set(&cfg, &domain, weight),
        },
        Commands::Interfaces { action } => match action {
            InterfacesAction::List { format } => {
                cli::run_interfaces_list(&cfg, cli::OutputFormat::from_str_opt(Some(&format)))
            }
            InterfacesAction::Set { interfaces } => cli::run_interfaces_set(&cfg, &interfaces),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
        },
    }
}

//! Stellar Admin - Entry Point
//!
//! Console commands talk to the admin API with the stored token; `serve`
//! runs the admin gateway.

use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stellar_admin::api::{AdminUserUpdateRequest, ConfigValueType, UserRole, UserStatus};
use stellar_admin::console::time::{format_timestamp, to_rfc3339};
use stellar_admin::console::PLANETS_PAGE_SIZE;
use stellar_admin::{
    AdminApi, ApiClient, Config, ConfigsPage, ConsoleError, FileTokenStore, GatewayConfig,
    GatewayServer, Session, SessionState, UsersPage,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "stellar-admin", version, about = "Stellar admin console and gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with the admin password
    Login {
        #[arg(long, env = "STELLAR_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in operator
    Whoami,
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },
    /// Manage app configs
    Configs {
        #[command(subcommand)]
        action: ConfigsCommand,
    },
    /// Run the admin gateway
    Serve,
}

#[derive(Subcommand)]
enum UsersCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        keyword: Option<String>,
    },
    Update {
        id: u64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
        #[arg(long)]
        status: Option<UserStatus>,
        #[arg(long)]
        subscriber: Option<bool>,
        /// Local `YYYY-MM-DDTHH:MM` or RFC 3339; empty clears it
        #[arg(long)]
        expires_at: Option<String>,
    },
    Delete {
        id: u64,
    },
    Planets {
        id: u64,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(Subcommand)]
enum ConfigsCommand {
    List,
    Set {
        key: String,
        #[arg(long)]
        value: String,
        #[arg(long = "type", default_value = "string")]
        value_type: ConfigValueType,
        #[arg(long, default_value = "")]
        alias: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let serve_mode = matches!(cli.command, Command::Serve);

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        })
        .unwrap_or(if serve_mode { Level::INFO } else { Level::WARN });

    if serve_mode {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_ansi(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        // Console output owns stdout; logs go to stderr as JSON
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    if serve_mode {
        info!("Stellar Admin Gateway v{}", env!("CARGO_PKG_VERSION"));
        let config = GatewayConfig::from_env()?;
        return GatewayServer::new(config)?.run().await;
    }

    let config = Config::from_env()?;
    let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let client = ApiClient::new(&config, tokens)?;

    let root = CancellationToken::new();
    let api = AdminApi::new(client)
        .with_strict_auth(config.strict_auth)
        .scoped(root.clone());

    let interrupt = {
        let root = root.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                root.cancel();
            }
        })
    };

    let result = run_console(cli.command, api).await;
    interrupt.abort();

    match result {
        Err(e) if e.downcast_ref::<ConsoleError>().is_some_and(ConsoleError::is_cancelled) => {
            bail!("interrupted")
        }
        other => other,
    }
}

async fn run_console(command: Command, api: AdminApi) -> Result<()> {
    match command {
        Command::Login { password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let mut session = Session::new(api);
            let state = session.login(&password).await?;
            report_session(state)
        }
        Command::Logout => {
            Session::new(api).logout()?;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let mut session = Session::new(api);
            let state = session.restore().await;
            report_session(state)
        }
        Command::Users { action } => run_users(action, api).await,
        Command::Configs { action } => run_configs(action, api).await,
        Command::Serve => bail!("serve is not a console command"),
    }
}

fn report_session(state: &SessionState) -> Result<()> {
    println!("{}", state.describe());
    if !state.is_ready() {
        bail!("console is not available");
    }
    Ok(())
}

fn read_password() -> Result<String> {
    eprint!("password: ");
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run_users(action: UsersCommand, api: AdminApi) -> Result<()> {
    match action {
        UsersCommand::List { page, keyword } => {
            let mut users = UsersPage::new(&api);
            users
                .open(page, keyword.as_deref().unwrap_or_default())
                .await?;

            println!(
                "{:>8}  {:<20}  {:<14}  {:<6}  {:<8}  {:<10}  {}",
                "ID", "USERNAME", "PHONE", "ROLE", "STATUS", "SUBSCRIBER", "CREATED"
            );
            for user in users.users() {
                println!(
                    "{:>8}  {:<20}  {:<14}  {:<6}  {:<8}  {:<10}  {}",
                    user.id,
                    user.username,
                    user.phone,
                    user.role.as_str(),
                    user.status.as_str(),
                    if user.is_subscriber { "yes" } else { "no" },
                    format_timestamp(Some(&user.created_at)),
                );
            }
            println!();
            println!("{} (subscribers: {})", users.footer_text(), users.subscriber_total());
            Ok(())
        }
        UsersCommand::Update {
            id,
            username,
            avatar,
            role,
            status,
            subscriber,
            expires_at,
        } => {
            let req = AdminUserUpdateRequest {
                username: username.map(|u| u.trim().to_string()),
                avatar: avatar.map(|a| a.trim().to_string()),
                role,
                status,
                is_subscriber: subscriber,
                subscription_expires_at: expires_at.map(|e| to_rfc3339(&e)),
            };
            let user = api.update_user(id, &req).await.map_err(ConsoleError::from)?;
            println!("updated user {} ({})", user.id, user.username);
            Ok(())
        }
        UsersCommand::Delete { id } => {
            api.delete_user(id).await.map_err(ConsoleError::from)?;
            println!("deleted user {}", id);
            Ok(())
        }
        UsersCommand::Planets { id, page } => {
            let planets = api
                .list_user_planets(id, page.max(1), PLANETS_PAGE_SIZE)
                .await
                .map_err(ConsoleError::from)?;

            for planet in &planets.data {
                println!(
                    "{:<12}  {:<20}  {:<10}  {}",
                    planet.planet_no,
                    planet.name,
                    planet.date_key,
                    planet.keywords.join(", ")
                );
            }
            println!();
            println!(
                "{} planets, page {}/{}",
                planets.total,
                planets.page,
                planets.total_pages.max(1)
            );
            Ok(())
        }
    }
}

async fn run_configs(action: ConfigsCommand, api: AdminApi) -> Result<()> {
    let mut configs = ConfigsPage::new(&api);

    match action {
        ConfigsCommand::List => {
            configs.load().await?;
            for config in configs.configs() {
                println!(
                    "{:<28}  {:<8}  {:<24}  {}",
                    config.config_key,
                    config.value_type.as_str(),
                    config.config_value,
                    config.alias
                );
            }
            Ok(())
        }
        ConfigsCommand::Set {
            key,
            value,
            value_type,
            alias,
            description,
        } => {
            let form = configs.form_mut();
            form.key = key;
            form.config_value = value;
            form.value_type = value_type;
            form.alias = alias;
            form.description = description;

            let saved = configs.submit().await?;
            println!("saved {} = {}", saved.config_key, saved.config_value);
            Ok(())
        }
        ConfigsCommand::Delete { key } => {
            configs.delete(&key).await?;
            println!("deleted {}", key);
            Ok(())
        }
    }
}

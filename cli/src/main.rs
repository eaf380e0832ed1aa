use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use client::config::{ConfigError, load_permission_map, route_table_from_env};
use client::net::api::HttpAuthApi;
use serde_json::{Value, json};
use session::validate::check_session;
use session::{
    Access, ApiError, AuthApi, Clock, PermissionMap, RouteDecision, RouteKind, RouteTable, SessionCheck,
    SystemClock, codec,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing session token; pass --token or set ADMIN_SESSION_TOKEN")]
    MissingToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway health check failed: HTTP {0}")]
    Unhealthy(u16),
    #[error("token decode failed: {0}")]
    Decode(#[from] codec::CodecError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "admin-session", about = "Admin session guard tooling")]
struct Cli {
    /// Edge gateway, for `ping`.
    #[arg(long, env = "GATEWAY_URL", default_value = "http://127.0.0.1:3000")]
    gateway_url: String,

    /// External auth API, for `whoami`.
    #[arg(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:8000/api")]
    api_base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the gateway health endpoint.
    Ping,
    Token(TokenCommand),
    /// Classify a path and show where the edge guard would send it.
    Route {
        path: String,
        #[arg(long, default_value_t = false)]
        authenticated: bool,
    },
    /// Evaluate a permission map for a path.
    Authorize(AuthorizeArgs),
    /// Validate a stored token/expiry pair.
    Check {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        expires_at: Option<String>,
        /// Epoch milliseconds; defaults to the current time.
        #[arg(long)]
        now: Option<i64>,
    },
    /// Show the user the API associates with a token.
    Whoami {
        #[arg(long, env = "ADMIN_SESSION_TOKEN")]
        token: Option<String>,
    },
}

#[derive(Args, Debug)]
struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Subcommand, Debug)]
enum TokenSubcommand {
    /// Encode a token the way browser storage and cookies hold it.
    Obfuscate { token: String },
    /// Decode a stored token.
    Reveal { encoded: String },
}

#[derive(Args, Debug)]
struct AuthorizeArgs {
    path: String,

    #[arg(long, env = "PERMISSION_MAP_FILE")]
    map: PathBuf,

    /// Permission the user holds; repeat for several.
    #[arg(long = "permission")]
    permissions: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let output = match cli.command {
        Command::Ping => run_ping(&cli.gateway_url).await?,
        Command::Token(token) => run_token(token)?,
        Command::Route { path, authenticated } => run_route(&route_table_from_env()?, &path, authenticated),
        Command::Authorize(args) => {
            let map = load_permission_map(&args.map)?;
            run_authorize(&map, &args.path, &args.permissions)
        }
        Command::Check { token, expires_at, now } => {
            run_check(token.as_deref(), expires_at.as_deref(), now.unwrap_or_else(|| SystemClock.now_ms()))
        }
        Command::Whoami { token } => run_whoami(&cli.api_base_url, token).await?,
    };
    print_json(&output)
}

async fn run_ping(gateway_url: &str) -> Result<Value, CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", gateway_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::Unhealthy(status.as_u16()));
    }
    Ok(json!({ "status": "ok" }))
}

fn run_token(token: TokenCommand) -> Result<Value, CliError> {
    match token.command {
        TokenSubcommand::Obfuscate { token } => Ok(json!({ "encoded": codec::obfuscate(&token) })),
        TokenSubcommand::Reveal { encoded } => Ok(json!({ "token": codec::reveal(&encoded)? })),
    }
}

fn run_route(routes: &RouteTable, path: &str, authenticated: bool) -> Value {
    let (decision, target) = match routes.decide(path, authenticated) {
        RouteDecision::Allow => ("allow", None),
        RouteDecision::Redirect(target) => ("redirect", Some(target)),
    };
    let kind = match routes.classify(path) {
        RouteKind::Login => "login",
        RouteKind::Protected => "protected",
        RouteKind::Public => "public",
    };
    json!({
        "path": path,
        "kind": kind,
        "decision": decision,
        "target": target,
    })
}

fn run_authorize(map: &PermissionMap, path: &str, permissions: &[String]) -> Value {
    let requirement = map.requirement_for(path);
    let granted = matches!(map.authorize(path, permissions), Access::Granted);
    json!({
        "path": path,
        "requirement": requirement,
        "granted": granted,
    })
}

fn run_check(token: Option<&str>, expires_at: Option<&str>, now: i64) -> Value {
    let (check, expires_at) = match check_session(token, expires_at, now) {
        SessionCheck::Valid { expires_at } => ("valid", Some(expires_at)),
        SessionCheck::NoSession => ("no_session", None),
        SessionCheck::Expired => ("expired", None),
    };
    json!({
        "check": check,
        "expires_at": expires_at,
        "now": now,
    })
}

async fn run_whoami(api_base_url: &str, token: Option<String>) -> Result<Value, CliError> {
    let token = token.filter(|t| !t.trim().is_empty()).ok_or(CliError::MissingToken)?;
    let api = HttpAuthApi::new(api_base_url)?;
    let user = api.current_user(token.trim()).await?;
    Ok(serde_json::to_value(user)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

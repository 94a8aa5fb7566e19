use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-ctl")]
#[command(about = "Control plane CLI for media-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8097")]
    url: String,

    #[arg(short, long, env = "GATEWAY_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gateway status
    Status,
    /// Serve the given HTML to every non-exempt request with 503
    SetOverride {
        /// HTML body, or @path to read it from a file
        body: String,
    },
    /// Resume normal dispatch
    ClearOverride,
    /// Start a graceful shutdown
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => {
            client
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::SetOverride { body } => {
            let body = match body.strip_prefix('@') {
                Some(path) => std::fs::read_to_string(path)?,
                None => body,
            };
            client
                .put(format!("{}/admin/override", cli.url))
                .headers(headers)
                .body(body)
                .send()
                .await?
        }
        Commands::ClearOverride => {
            client
                .delete(format!("{}/admin/override", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Shutdown => {
            client
                .post(format!("{}/admin/shutdown", cli.url))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: control plane returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
    } else {
        let json: Value = serde_json::from_str(&text)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(())
}

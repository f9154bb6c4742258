use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "lb-cli")]
#[command(about = "Management CLI for the JSON load balancer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:30000")]
    url: String,

    /// Bearer key, when the balancer requires one.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an instance to the pool
    Add { address: String },
    /// Remove an instance from the pool
    Remove { address: String },
    /// List healthy, available and all instances
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    match cli.command {
        Commands::Add { address } => {
            let res = client
                .put(format!("{}/addinstance", cli.url))
                .headers(headers)
                .body(address.clone())
                .send()
                .await?;
            print_outcome(res, "added", &address).await;
        }
        Commands::Remove { address } => {
            let res = client
                .put(format!("{}/removeinstance", cli.url))
                .headers(headers)
                .body(address.clone())
                .send()
                .await?;
            print_outcome(res, "removed", &address).await;
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: status endpoint returned {}", status);
                return Ok(());
            }
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn print_outcome(res: reqwest::Response, verb: &str, address: &str) {
    let status = res.status();
    if status.is_success() {
        println!("{} {}", verb, address);
    } else {
        eprintln!("Error: load balancer returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
    }
}

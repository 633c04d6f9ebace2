use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "cep-cli")]
#[command(about = "Command-line client for the CEP weather service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081", env = "CEP_SERVICE_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the current temperature for a CEP
    Lookup {
        /// Eight-digit postal code
        cep: String,
    },
    /// Check that the service is up
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Lookup { cep } => {
            let res = client
                .post(format!("{base}/cep"))
                .json(&json!({ "cep": cep }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            let status = res.status();
            println!("{} {}", status.as_u16(), res.text().await?);
            if !status.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> anyhow::Result<()> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }

    println!("{}", rendered);
    Ok(())
}

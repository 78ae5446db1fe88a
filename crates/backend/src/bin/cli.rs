use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::{header, redirect, Client, Response};
use shared_types::{ErrorDetail, LoginRequest, LoginResponse, SignupRequest, SignupResponse};

#[derive(Parser)]
#[command(name = "auth-cli")]
#[command(about = "CLI for exercising the auth backend API")]
#[command(
    long_about = "A command-line interface for the auth backend server.\n\n\
    Creates local accounts, logs in to obtain a bearer token, and prints the\n\
    Google consent URL the server redirects browsers to."
)]
struct Cli {
    /// Backend server URL to connect to.
    #[arg(
        short,
        long,
        default_value = "http://localhost:8000",
        env = "AUTH_API_URL"
    )]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new local account
    Signup {
        #[arg(short, long)]
        email: String,

        /// Password for the new account.
        #[arg(short, long, env = "AUTH_PASSWORD")]
        password: String,
    },

    /// Log in and print the bearer token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "AUTH_PASSWORD")]
        password: String,
    },

    /// Print the Google consent URL served by `/auth/google`
    GoogleUrl,
}

struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    fn new(base_url: String) -> anyhow::Result<Self> {
        // Redirects are inspected, not followed
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn signup(&self, email: String, password: String) -> anyhow::Result<SignupResponse> {
        let response = self
            .client
            .post(format!("{}/signup", self.base_url))
            .json(&SignupRequest { email, password })
            .send()
            .await
            .context("Failed to reach server")?;
        parse_json(response).await
    }

    async fn login(&self, email: String, password: String) -> anyhow::Result<LoginResponse> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .context("Failed to reach server")?;
        parse_json(response).await
    }

    async fn google_url(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .get(format!("{}/auth/google", self.base_url))
            .send()
            .await
            .context("Failed to reach server")?;

        if !response.status().is_redirection() {
            bail!("Expected a redirect, got {}", response.status());
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .context("Redirect has no Location header")?
            .to_str()
            .context("Location header is not valid text")?;
        Ok(location.to_string())
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("Invalid response body");
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorDetail>(&body) {
        Ok(err) => bail!("{} ({})", err.detail, status),
        Err(_) => bail!("Request failed ({}): {}", status, body),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(cli.base_url)?;

    match cli.command {
        Commands::Signup { email, password } => {
            let created = api.signup(email, password).await?;
            println!("{} (id {})", created.message, created.id);
        }
        Commands::Login { email, password } => {
            let login = api.login(email, password).await?;
            println!("{}", login.token);
        }
        Commands::GoogleUrl => {
            println!("{}", api.google_url().await?);
        }
    }

    Ok(())
}

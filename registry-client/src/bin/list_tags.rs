use std::path::PathBuf;

use registry_client::auth::Credentials;
use registry_client::{list_all_tags, Error};

use clap::{Args, Parser};
use log::info;

#[derive(Args, Debug)]
struct AuthArgs {
    /// Opaque credential blob (base64 encoded JSON)
    #[arg(long, conflicts_with = "username")]
    auth: Option<String>,

    /// Registry user name
    #[arg(short, long, requires = "password")]
    username: Option<String>,

    /// Registry password
    #[arg(short, long)]
    password: Option<String>,
}

impl AuthArgs {
    fn credentials(&self) -> Option<String> {
        if let Some(blob) = &self.auth {
            return Credentials::decode(blob).map(|c| c.to_string());
        }

        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some(Credentials::new(u, p).to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Image reference without tag, e.g. registry.example.com/ns/app
    reference: String,

    #[command(flatten)]
    auth: AuthArgs,

    /// Directory with CA certificates and client key pair for the registry
    #[arg(short, long)]
    cert_dir: Option<PathBuf>,

    /// Accept any server certificate and allow plain http
    #[arg(short = 'k', long)]
    skip_tls_verify: bool,
}

fn main() -> Result<(), Error> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let credentials = cli.auth.credentials();
    let tags = list_all_tags(
        &cli.reference,
        credentials.as_deref(),
        cli.cert_dir.as_deref(),
        cli.skip_tls_verify,
    )?;

    info!("{} tag(s) in {}", tags.len(), cli.reference);
    for tag in tags {
        println!("{}", tag);
    }

    Ok(())
}

use clap::{ArgGroup, Args, Parser, Subcommand};
use log::info;
use registry_client::auth::encode_json_auth;
use skopeo_relay::{
    Platform, Relay, RelayConfig, RelayError, RelayResult, SkopeoRelay, SyncReport, SyncRequest,
    TagFilter, TagSelector,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli
{
    /// skopeo binary, none to look it up in PATH
    #[arg(short, long, default_value = "")]
    binary: String,

    /// root of the per-registry certificate directories, none to use /etc/skopeo/certs.d
    #[arg(short, long, default_value = "")]
    certs_dir: String,

    /// skopeo sub-command used for transfers: copy or sync
    #[arg(short, long, default_value = "copy")]
    mode: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Check that skopeo can be executed
    Prepare,

    /// Sync tags from a source to a target repository
    Sync(SyncArgs),

    /// Print the credential blob accepted by --src-auth and --dest-auth
    EncodeAuth
    {
        /// Registry user name
        #[arg(short, long)]
        username: String,

        /// Registry password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("selector").required(true).args(["tag", "all_tags"])))]
struct SyncArgs
{
    /// source repository, e.g. registry.example.com/ns/app
    source: String,

    /// target repository, e.g. mirror.example.com/ns/app
    target: String,

    /// tag to sync, may be repeated
    #[arg(short, long)]
    tag: Vec<String>,

    /// sync every tag present in the source repository
    #[arg(short, long)]
    all_tags: bool,

    /// only sync expanded tags matching this regex, prefix with ! to negate
    #[arg(short = 'f', long, requires = "all_tags")]
    tag_filter: Option<String>,

    /// platform to sync: all, os/arch[/variant], none for skopeo's default
    #[arg(short, long, default_value = "")]
    platform: String,

    /// don't verify the source registry's TLS certificate
    #[arg(long)]
    src_skip_tls_verify: bool,

    /// don't verify the target registry's TLS certificate
    #[arg(long)]
    dest_skip_tls_verify: bool,

    /// source credentials (see encode-auth)
    #[arg(long, default_value = "")]
    src_auth: String,

    /// target credentials (see encode-auth)
    #[arg(long, default_value = "")]
    dest_auth: String,

    /// show skopeo's output
    #[arg(short, long)]
    verbose: bool,
}

impl SyncArgs
{
    fn into_request(self) -> RelayResult<SyncRequest>
    {
        let tags = match self.all_tags {
            true => TagSelector::Expand(self.tag_filter.as_deref().map(TagFilter::parse).transpose()?),
            false => TagSelector::Explicit(self.tag),
        };

        let mut request = SyncRequest::new(&self.source, &self.target, tags);
        request.platform = Platform::try_from(self.platform.as_str())?;
        request.source_skip_tls_verify = self.src_skip_tls_verify;
        request.target_skip_tls_verify = self.dest_skip_tls_verify;
        request.source_auth = self.src_auth;
        request.target_auth = self.dest_auth;
        request.verbose = self.verbose;

        Ok(request)
    }
}

fn print_report(report: &SyncReport)
{
    for (tag, outcome) in report.outcomes() {
        println!("{}: {}", tag, outcome);
    }
    info!("{} tag(s) processed", report.len());
}

fn run_sync(relay: &SkopeoRelay, request: SyncRequest) -> RelayResult<()>
{
    relay.prepare()?;

    let result = relay.sync(&request);
    match &result {
        Ok(report) | Err(RelayError::PartialFailure(report)) => print_report(report),
        Err(_) => (),
    }

    relay.dispose()?;
    result.map(|_| ())
}

fn main() -> RelayResult<()>
{
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let conf = RelayConfig {
        binary: cli.binary,
        certs_dir: cli.certs_dir,
        mode: cli.mode,
    };

    match cli.command {
        Commands::Prepare => SkopeoRelay::new(Some(&conf), None).prepare()?,
        Commands::Sync(args) => {
            let request = args.into_request()?;
            let relay = SkopeoRelay::new(Some(&conf), None);
            info!("Syncing {} to {}", request.source_ref, request.target_ref);
            run_sync(&relay, request)?
        }
        Commands::EncodeAuth { username, password } => {
            println!("{}", encode_json_auth(&username, &password))
        }
    }

    Ok(())
}

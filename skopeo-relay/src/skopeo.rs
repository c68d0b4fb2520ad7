use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{error, info};
use registry_client::auth::decode_json_auth;
use registry_client::reference::{join_refs_and_tag, split_ref};

use crate::config::{RelayConfig, ResolvedConfig};
use crate::error::RelayError;
use crate::platform::Platform;
use crate::relay::{Relay, SyncReport, SyncRequest, TagOutcome};
use crate::runner::{stdout_sink, OutputSink, ProcessRunner, ToolRunner};
use crate::tags::{RegistryTagLister, TagLister};
use crate::RelayResult;

pub const RELAY_ID: &str = "skopeo";

const INSECURE_POLICY: &str = "--insecure-policy";
const TRANSPORT: &str = "docker://";
const VERSION_FLAG: &str = "--version";

/// Relay driving `skopeo` once per tag.
pub struct SkopeoRelay
{
    config: ResolvedConfig,
    out: OutputSink,
    runner: Box<dyn ToolRunner>,
    lister: Box<dyn TagLister>,
}

impl SkopeoRelay
{
    pub fn new(conf: Option<&RelayConfig>, out: Option<OutputSink>) -> Self
    {
        let config = ResolvedConfig::resolve(conf);
        let runner = Box::new(ProcessRunner::new(&config.binary));
        Self::with_collaborators(config, out, runner, Box::new(RegistryTagLister))
    }

    pub fn with_collaborators(
        config: ResolvedConfig,
        out: Option<OutputSink>,
        runner: Box<dyn ToolRunner>,
        lister: Box<dyn TagLister>,
    ) -> Self
    {
        SkopeoRelay {
            config,
            out: out.unwrap_or_else(stdout_sink),
            runner,
            lister,
        }
    }

    pub fn config(&self) -> &ResolvedConfig
    {
        &self.config
    }

    /// Arguments shared by every tag of a request, plus the source
    /// certificate directory needed for listing tags.
    fn base_command(
        &self,
        request: &SyncRequest,
        src_creds: Option<&str>,
        dest_creds: Option<&str>,
    ) -> (Vec<String>, Option<PathBuf>)
    {
        let mut cmd = vec![
            INSECURE_POLICY.to_string(),
            self.config.mode.as_str().to_string(),
        ];

        if request.source_skip_tls_verify {
            cmd.push("--src-tls-verify=false".to_string());
        }
        if request.target_skip_tls_verify {
            cmd.push("--dest-tls-verify=false".to_string());
        }

        let mut src_cert_dir = None;
        let (registry, _, _) = split_ref(&request.source_ref);
        if !registry.is_empty() {
            let dir = self.config.certs_dir_for_registry(&registry);
            cmd.push(format!("--src-cert-dir={}", dir.display()));
            src_cert_dir = Some(dir);
        }
        let (registry, _, _) = split_ref(&request.target_ref);
        if !registry.is_empty() {
            let dir = self.config.certs_dir_for_registry(&registry);
            cmd.push(format!("--dest-cert-dir={}", dir.display()));
        }

        if let Some(creds) = src_creds {
            cmd.push(format!("--src-creds={}", creds));
        }
        if let Some(creds) = dest_creds {
            cmd.push(format!("--dest-creds={}", creds));
        }

        (cmd, src_cert_dir)
    }

    fn tag_invocation(base: &[String], source: &str, target: &str, platform: &Platform) -> Vec<String>
    {
        let mut invocation = base.to_vec();
        invocation.push(format!("{}{}", TRANSPORT, source));
        invocation.push(format!("{}{}", TRANSPORT, target));
        platform.apply(&mut invocation);
        invocation
    }
}

impl Relay for SkopeoRelay
{
    fn prepare(&self) -> RelayResult<()>
    {
        let buf = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink: OutputSink = buf.clone();

        self.runner
            .run(&sink, true, &[VERSION_FLAG.to_string()])
            .map_err(RelayError::ToolUnavailable)?;

        if let Ok(banner) = buf.lock() {
            info!("{}", String::from_utf8_lossy(&banner).trim());
        }
        info!("Relay {} ready", RELAY_ID);

        Ok(())
    }

    fn dispose(&self) -> RelayResult<()>
    {
        Ok(())
    }

    fn sync(&self, request: &SyncRequest) -> RelayResult<SyncReport>
    {
        let src_creds = decode_json_auth(&request.source_auth);
        let dest_creds = decode_json_auth(&request.target_auth);

        let (cmd, src_cert_dir) = self.base_command(request, src_creds.as_deref(), dest_creds.as_deref());

        if request.tags.is_expand() {
            info!("Expanding tags of {}", request.source_ref);
        }
        let tags = request.tags.expand(|| {
            self.lister.list_tags(
                &request.source_ref,
                src_creds.as_deref(),
                src_cert_dir.as_deref(),
                request.source_skip_tls_verify,
            )
        })?;

        let mut report = SyncReport::default();

        for tag in tags.iter() {
            info!("Syncing tag {} (platform: {})", tag, request.platform);

            let (src, trgt) = join_refs_and_tag(&request.source_ref, &request.target_ref, tag);
            let invocation = Self::tag_invocation(&cmd, &src, &trgt, &request.platform);

            match self.runner.run(&self.out, request.verbose, &invocation) {
                Ok(()) => report.record(tag, TagOutcome::Synced),
                Err(e) => {
                    error!("Syncing tag {} failed: {}", tag, e);
                    report.record(tag, TagOutcome::Failed(e.to_string()));
                }
            }
        }

        if !report.is_success() {
            return Err(RelayError::PartialFailure(report));
        }

        Ok(report)
    }
}

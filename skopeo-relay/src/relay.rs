use std::fmt::Display;

use log::{debug, error};
use regex::Regex;

use crate::platform::Platform;
use crate::RelayResult;

/// Lifecycle every relay backend exposes to the mirroring system.
pub trait Relay: Send + Sync
{
    fn prepare(&self) -> RelayResult<()>;
    fn sync(&self, request: &SyncRequest) -> RelayResult<SyncReport>;
    fn dispose(&self) -> RelayResult<()>;
}

/// Regular expression on tag names, negated by a leading `!`.
#[derive(Debug, Clone)]
pub struct TagFilter
{
    regex: Regex,
    negate: bool,
}

impl TagFilter
{
    pub fn parse(pattern: &str) -> RelayResult<Self>
    {
        let (negate, pattern) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };

        let regex = Regex::new(pattern).inspect_err(|e| error!("Bad tag filter: {}", e))?;
        Ok(Self { regex, negate })
    }

    pub fn matches(&self, tag: &str) -> bool
    {
        self.regex.is_match(tag) != self.negate
    }
}

#[derive(Debug, Clone)]
pub enum TagSelector
{
    /// Tags named by the caller, synced in the given order.
    Explicit(Vec<String>),
    /// Every tag present on the source, optionally filtered.
    Expand(Option<TagFilter>),
}

impl TagSelector
{
    pub fn explicit<T: AsRef<str>>(tags: &[T]) -> Self
    {
        TagSelector::Explicit(tags.iter().map(|t| t.as_ref().to_string()).collect())
    }

    pub fn is_expand(&self) -> bool
    {
        matches!(self, TagSelector::Expand(_))
    }

    /// Resolve the tag sequence. `list` is only called for expansion.
    pub fn expand<F>(&self, list: F) -> RelayResult<Vec<String>>
    where
        F: FnOnce() -> Result<Vec<String>, registry_client::Error>,
    {
        match self {
            TagSelector::Explicit(tags) => Ok(tags.clone()),
            TagSelector::Expand(filter) => {
                let tags = list()?;
                let Some(filter) = filter else {
                    return Ok(tags);
                };

                let total = tags.len();
                let tags: Vec<String> = tags.into_iter().filter(|t| filter.matches(t)).collect();
                debug!("Tag filter kept {} of {} tag(s)", tags.len(), total);
                Ok(tags)
            }
        }
    }
}

/// One unit of work for a relay.
#[derive(Clone)]
pub struct SyncRequest
{
    pub source_ref: String,
    pub target_ref: String,
    pub tags: TagSelector,
    pub platform: Platform,
    pub source_skip_tls_verify: bool,
    pub target_skip_tls_verify: bool,
    pub source_auth: String,
    pub target_auth: String,
    pub verbose: bool,
}

impl SyncRequest
{
    pub fn new(source_ref: &str, target_ref: &str, tags: TagSelector) -> Self
    {
        SyncRequest {
            source_ref: source_ref.to_string(),
            target_ref: target_ref.to_string(),
            tags,
            platform: Platform::Default,
            source_skip_tls_verify: false,
            target_skip_tls_verify: false,
            source_auth: String::new(),
            target_auth: String::new(),
            verbose: false,
        }
    }
}

// auth blobs stay out of logs
impl std::fmt::Debug for SyncRequest
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("SyncRequest")
            .field("source_ref", &self.source_ref)
            .field("target_ref", &self.target_ref)
            .field("tags", &self.tags)
            .field("platform", &self.platform)
            .field("source_skip_tls_verify", &self.source_skip_tls_verify)
            .field("target_skip_tls_verify", &self.target_skip_tls_verify)
            .field("source_auth", &!self.source_auth.is_empty())
            .field("target_auth", &!self.target_auth.is_empty())
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome
{
    Synced,
    Failed(String),
}

impl TagOutcome
{
    pub fn is_failed(&self) -> bool
    {
        matches!(self, TagOutcome::Failed(_))
    }
}

impl Display for TagOutcome
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            TagOutcome::Synced => f.write_str("synced"),
            TagOutcome::Failed(e) => write!(f, "failed ({})", e),
        }
    }
}

/// Per tag outcomes of a sync, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport
{
    outcomes: Vec<(String, TagOutcome)>,
}

impl SyncReport
{
    pub fn record(&mut self, tag: &str, outcome: TagOutcome)
    {
        self.outcomes.push((tag.to_string(), outcome));
    }

    pub fn outcomes(&self) -> &[(String, TagOutcome)]
    {
        &self.outcomes
    }

    pub fn failed(&self) -> impl Iterator<Item = &str>
    {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(tag, _)| tag.as_str())
    }

    pub fn is_success(&self) -> bool
    {
        self.failed().next().is_none()
    }

    pub fn len(&self) -> usize
    {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.outcomes.is_empty()
    }
}

use std::fmt::Display;

use log::error;
use regex::Regex;

use crate::error::RelayError;
use crate::RelayResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpec
{
    pub os: String,
    pub arch: String,
    pub variant: Option<String>,
}

/// Which platforms of a multi-arch image get transferred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Platform
{
    /// Whatever the tool does by default.
    #[default]
    Default,
    All,
    Specific(PlatformSpec),
}

impl Platform
{
    const ALL: &'static str = "all";
    const REGEX: &'static str = r"^([a-z0-9]+)/([a-z0-9_]+)(?:/([a-z0-9]+))?$";

    const ALL_FLAG: &'static str = "--all";
    const OS_FLAG: &'static str = "--override-os";
    const ARCH_FLAG: &'static str = "--override-arch";
    const VARIANT_FLAG: &'static str = "--override-variant";

    pub fn parse(value: &str) -> RelayResult<Self>
    {
        match value {
            "" => return Ok(Platform::Default),
            Self::ALL => return Ok(Platform::All),
            _ => (),
        }

        let platform_re = Regex::new(Self::REGEX).expect("Platform regex is malformed");
        let Some(captures) = platform_re.captures(value) else {
            error!("Platform \"{}\" is not of the form os/arch[/variant]", value);
            return Err(RelayError::InvalidPlatform(value.to_string()));
        };

        Ok(Platform::Specific(PlatformSpec {
            os: captures[1].to_string(),
            arch: captures[2].to_string(),
            variant: captures.get(3).map(|v| v.as_str().to_string()),
        }))
    }

    /// Append the tool flags selecting this platform.
    pub fn apply(&self, args: &mut Vec<String>)
    {
        match self {
            Platform::Default => (),
            Platform::All => args.push(Self::ALL_FLAG.to_string()),
            Platform::Specific(spec) => {
                args.push(format!("{}={}", Self::OS_FLAG, spec.os));
                args.push(format!("{}={}", Self::ARCH_FLAG, spec.arch));
                if let Some(variant) = &spec.variant {
                    args.push(format!("{}={}", Self::VARIANT_FLAG, variant));
                }
            }
        }
    }
}

impl TryFrom<&str> for Platform
{
    type Error = RelayError;
    fn try_from(value: &str) -> Result<Self, Self::Error>
    {
        Self::parse(value)
    }
}

impl Display for Platform
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            Platform::Default => f.write_str("default"),
            Platform::All => f.write_str(Self::ALL),
            Platform::Specific(spec) => match &spec.variant {
                Some(variant) => write!(f, "{}/{}/{}", spec.os, spec.arch, variant),
                None => write!(f, "{}/{}", spec.os, spec.arch),
            },
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn flags(value: &str) -> Vec<String>
    {
        let mut args = Vec::new();
        Platform::parse(value).unwrap().apply(&mut args);
        args
    }

    #[test]
    fn default_adds_nothing()
    {
        assert!(flags("").is_empty());
    }

    #[test]
    fn all_platforms()
    {
        assert_eq!(flags("all"), vec!["--all"]);
    }

    #[test]
    fn specific_platform()
    {
        assert_eq!(flags("linux/arm64"), vec!["--override-os=linux", "--override-arch=arm64"]);
        assert_eq!(
            flags("linux/arm/v7"),
            vec!["--override-os=linux", "--override-arch=arm", "--override-variant=v7"]
        );
        assert_eq!(Platform::parse("linux/x86_64").unwrap().to_string(), "linux/x86_64");
    }

    #[test]
    fn rejects_garbage()
    {
        for value in ["linux", "linux/", "/arm64", "Linux/amd64", "linux/arm/v7/x", "all/"] {
            assert!(
                matches!(Platform::try_from(value), Err(RelayError::InvalidPlatform(_))),
                "{value} should be rejected"
            );
        }
    }
}

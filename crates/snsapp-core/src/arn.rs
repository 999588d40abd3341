// # Platform Application Identifiers
//
// The remote service mints one ARN per platform application and there is no
// describe call that returns name or platform. Both are therefore recovered
// from the identifier on every read:
//
// ```text
// arn:<partition>:sns:<region>:<account-id>:app/<platform>/<name>
// ```
//
// The rendered form must stay bit-exact, it is what gets persisted as the
// resource ID.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const ARN_PREFIX: &str = "arn";
const ARN_SECTIONS: usize = 6;
const APP_RESOURCE_KIND: &str = "app";

/// A generic Amazon Resource Name split into its sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    /// Partition, e.g. "aws" or "aws-cn"
    pub partition: String,
    /// Service namespace, e.g. "sns"
    pub service: String,
    /// Region, e.g. "us-east-1"
    pub region: String,
    /// Twelve-digit account ID
    pub account_id: String,
    /// Service-specific resource path; may itself contain ':'
    pub resource: String,
}

impl FromStr for Arn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let sections: Vec<&str> = s.splitn(ARN_SECTIONS, ':').collect();
        if sections.len() != ARN_SECTIONS {
            return Err(Error::malformed_identifier(s, "not enough sections"));
        }
        if sections[0] != ARN_PREFIX {
            return Err(Error::malformed_identifier(s, "invalid prefix"));
        }
        if sections[1].is_empty() {
            return Err(Error::malformed_identifier(s, "missing partition"));
        }
        if sections[2].is_empty() {
            return Err(Error::malformed_identifier(s, "missing service"));
        }
        if sections[5].is_empty() {
            return Err(Error::malformed_identifier(s, "missing resource"));
        }

        Ok(Self {
            partition: sections[1].to_string(),
            service: sections[2].to_string(),
            region: sections[3].to_string(),
            account_id: sections[4].to_string(),
            resource: sections[5].to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}",
            ARN_PREFIX, self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// An ARN known to address an SNS platform application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformApplicationArn {
    arn: Arn,
    platform: String,
    name: String,
}

impl PlatformApplicationArn {
    /// Parse an identifier into a platform application address
    ///
    /// The resource section must split on '/' into exactly three parts, the
    /// first of which is literally `app`.
    pub fn parse(identifier: &str) -> Result<Self> {
        let arn: Arn = identifier.parse()?;

        let parts: Vec<&str> = arn.resource.split('/').collect();
        if parts.len() != 3 || parts[0] != APP_RESOURCE_KIND {
            return Err(Error::malformed_identifier(
                identifier,
                format!("resource {:?} is not app/PLATFORM/NAME", arn.resource),
            ));
        }

        let platform = parts[1].to_string();
        let name = parts[2].to_string();

        Ok(Self {
            arn,
            platform,
            name,
        })
    }

    /// Build the identifier the service would mint for an application
    pub fn new(
        partition: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        platform: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let platform = platform.into();
        let name = name.into();
        Self {
            arn: Arn {
                partition: partition.into(),
                service: "sns".to_string(),
                region: region.into(),
                account_id: account_id.into(),
                resource: format!("{}/{}/{}", APP_RESOURCE_KIND, platform, name),
            },
            platform,
            name,
        }
    }

    /// The underlying ARN
    pub fn arn(&self) -> &Arn {
        &self.arn
    }

    /// Push platform, the second resource segment
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Application name, the third resource segment
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PlatformApplicationArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.arn.fmt(f)
    }
}

impl FromStr for PlatformApplicationArn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

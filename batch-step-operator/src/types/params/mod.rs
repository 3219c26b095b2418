pub mod backend;

pub use backend::{BackendCapabilities, ComputeBackend};

use std::fmt;

/// Parsed AWS resource name.
/// Format: arn:partition:service:region:account-id:resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    /// Parse an ARN string into its components. Region and account id may be
    /// empty for global services; the other fields may not.
    pub fn parse(arn_str: &str) -> Result<Self, &'static str> {
        if arn_str.trim().is_empty() {
            return Err("ARN string cannot be empty");
        }

        let parts: Vec<&str> = arn_str.split(':').collect();

        if parts.len() != 6 || parts[0] != "arn" {
            return Err("Invalid ARN format");
        }

        if parts[1].is_empty() {
            return Err("Partition cannot be empty");
        }

        if parts[2].is_empty() {
            return Err("Service cannot be empty");
        }

        if parts[5].is_empty() {
            return Err("Resource cannot be empty");
        }

        Ok(Arn {
            partition: parts[1].to_string(),
            service: parts[2].to_string(),
            region: parts[3].to_string(),
            account_id: parts[4].to_string(),
            resource: parts[5].to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_arn() {
        let arn = Arn::parse("arn:aws:iam::123456789012:role/batch-job-role").unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "iam");
        assert_eq!(arn.region, "");
        assert_eq!(arn.account_id, "123456789012");
        assert_eq!(arn.resource, "role/batch-job-role");
        assert_eq!(arn.to_string(), "arn:aws:iam::123456789012:role/batch-job-role");
    }

    #[test]
    fn test_parse_rejects_malformed_arns() {
        assert!(Arn::parse("").is_err());
        assert!(Arn::parse("role/batch-job-role").is_err());
        assert!(Arn::parse("arn:aws:iam::123456789012").is_err());
        assert!(Arn::parse("arn::iam::123456789012:role/x").is_err());
        assert!(Arn::parse("arn:aws:iam::123456789012:").is_err());
    }
}

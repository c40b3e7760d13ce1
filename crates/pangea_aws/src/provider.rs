//! The `hashicorp/aws` provider.

use pangea_core::validation::cached_regex;
use pangea_core::{Block, PangeaError, PangeaResult, ProviderBlock};

use crate::types::Tags;

pub const PROVIDER_NAME: &str = "aws";
pub const PROVIDER_SOURCE: &str = "hashicorp/aws";
pub const DEFAULT_PROVIDER_VERSION: &str = "~> 5.0";

const REGION_PATTERN: &str = r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d$";

/// Build the AWS provider block.
///
/// `default_tags` are applied by the provider to every taggable resource and
/// emitted as `default_tags { tags = {...} }` when non-empty.
pub fn aws_provider(region: &str, profile: Option<&str>, default_tags: &Tags) -> ProviderBlock {
    let tags = (!default_tags.is_empty()).then(|| Block::new().map("tags", default_tags));

    let settings = Block::new()
        .attr("region", region)
        .opt("profile", profile)
        .opt_block("default_tags", tags);

    ProviderBlock::new(PROVIDER_NAME, PROVIDER_SOURCE, DEFAULT_PROVIDER_VERSION).with_settings(settings)
}

/// Check a region name such as `us-east-1` or `us-gov-west-1`.
pub fn validate_region(region: &str) -> PangeaResult<()> {
    let re = cached_regex(REGION_PATTERN).map_err(|e| PangeaError::Config(e.to_string()))?;
    if re.is_match(region) {
        Ok(())
    } else {
        Err(PangeaError::Config(format!(
            "'{}' is not a valid AWS region",
            region
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_without_tags() {
        let provider = aws_provider("eu-west-1", None, &Tags::new());
        assert_eq!(provider.settings.clone().into_value(), json!({ "region": "eu-west-1" }));
        assert_eq!(
            provider.requirement(),
            json!({ "source": "hashicorp/aws", "version": "~> 5.0" })
        );
    }

    #[test]
    fn test_provider_with_profile_and_tags() {
        let mut tags = Tags::new();
        tags.insert("Environment".to_string(), "prod".to_string());
        let provider = aws_provider("us-east-1", Some("ops"), &tags);
        assert_eq!(
            provider.settings.clone().into_value(),
            json!({
                "region": "us-east-1",
                "profile": "ops",
                "default_tags": { "tags": { "Environment": "prod" } }
            })
        );
    }

    #[test]
    fn test_validate_region() {
        assert!(validate_region("us-east-1").is_ok());
        assert!(validate_region("us-gov-west-1").is_ok());
        assert!(validate_region("ap-southeast-2").is_ok());
        assert!(validate_region("US-EAST-1").is_err());
        assert!(validate_region("mars").is_err());
    }
}

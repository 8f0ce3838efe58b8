use crate::request::domains::{CreateCustomDomainConfig, CustomDomainConfig};
use serde::Serialize;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomDomainBody<'a> {
    pub domain_name: &'a str,

    #[serde(flatten)]
    pub config: &'a CustomDomainConfig,
}

impl<'a> From<&'a CreateCustomDomainConfig> for CreateCustomDomainBody<'a> {
    fn from(config: &'a CreateCustomDomainConfig) -> Self {
        Self {
            domain_name: &config.domain,
            config: &config.config,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PublishVersionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

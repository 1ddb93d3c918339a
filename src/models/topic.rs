use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::required;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Pdf,
}

impl FromStr for ResourceType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ResourceType::Video),
            "pdf" => Ok(ResourceType::Pdf),
            _ => Err(AppError::Validation(
                "Resource type must be \"video\" or \"pdf\"".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: String,
    pub lecture_id: String,
    pub name: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub resource_link: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicWithCompletion {
    #[serde(flatten)]
    pub topic: Topic,
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub resource_link: String,
}

/// A topic request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidTopic {
    pub name: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub resource_link: String,
}

impl TopicRequest {
    pub fn validate(self) -> Result<ValidTopic, AppError> {
        if self.name.trim().is_empty()
            || self.resource_type.trim().is_empty()
            || self.resource_link.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Topic name, resource type, and resource link are required".to_string(),
            ));
        }
        Ok(ValidTopic {
            name: required(&self.name, "Topic name")?,
            description: self.description.unwrap_or_default(),
            resource_type: self.resource_type.trim().parse()?,
            resource_link: required(&self.resource_link, "Resource link")?,
        })
    }
}

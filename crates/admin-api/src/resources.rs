//! Admin resource collections under `/api/admin/<resource>`.

use std::fmt;
use std::str::FromStr;

use admin_auth::endpoints::ADMIN_PREFIX;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::upload::Upload;

/// Collections managed from the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Subjects,
    Sections,
    Lessons,
    Notes,
    Questions,
    Users,
    Payments,
    Pricing,
    Images,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Subjects,
        Resource::Sections,
        Resource::Lessons,
        Resource::Notes,
        Resource::Questions,
        Resource::Users,
        Resource::Payments,
        Resource::Pricing,
        Resource::Images,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Subjects => "subjects",
            Resource::Sections => "sections",
            Resource::Lessons => "lessons",
            Resource::Notes => "notes",
            Resource::Questions => "questions",
            Resource::Users => "users",
            Resource::Payments => "payments",
            Resource::Pricing => "pricing",
            Resource::Images => "images",
        }
    }

    pub fn collection_path(&self) -> String {
        format!("{ADMIN_PREFIX}/{}", self.as_str())
    }

    pub fn item_path(&self, id: &str) -> Result<String, ApiError> {
        let id = id.trim();
        if id.is_empty() || id.contains(['/', '?', '#']) {
            return Err(ApiError::local(format!("invalid {} id '{id}'", self.as_str())));
        }
        Ok(format!("{}/{id}", self.collection_path()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource '{0}' (expected one of: subjects, sections, lessons, notes, questions, users, payments, pricing, images)")]
pub struct ResourceParseError(String);

impl FromStr for Resource {
    type Err = ResourceParseError;

    /// Accepts plural or singular names, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Resource::ALL
            .into_iter()
            .find(|r| {
                let plural = r.as_str();
                name == plural || plural.strip_suffix('s') == Some(name.as_str())
            })
            .ok_or(ResourceParseError(s.to_owned()))
    }
}

impl ApiClient {
    /// List a collection. `query` carries paging and filter parameters.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.get_with_query(&resource.collection_path(), query).await
    }

    pub async fn fetch<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, ApiError> {
        self.get(&resource.item_path(id)?).await
    }

    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(&resource.collection_path(), body).await
    }

    /// Full update (PUT).
    pub async fn update<B, T>(&self, resource: Resource, id: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.put(&resource.item_path(id)?, body).await
    }

    pub async fn remove<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, ApiError> {
        self.delete(&resource.item_path(id)?).await
    }

    /// Multipart image upload to the images collection.
    pub async fn upload_image<T: DeserializeOwned>(&self, upload: Upload) -> Result<T, ApiError> {
        self.upload(&Resource::Images.collection_path(), upload).await
    }
}

//! Typed client for user profiles.
//!
//! `GET /rest/v1/profiles?select=id,full_name,email&id=in.("a","b")`
//! resolves a batch of user ids in one request.

use serde::Deserialize;

use crate::error::{check_status, BackendError};

/// Path of the profiles table in the REST row API.
pub(crate) const PROFILES_PATH: &str = "rest/v1/profiles";

/// A user profile row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for user profiles.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    http: reqwest::Client,
    url: url::Url,
}

impl ProfileClient {
    pub(crate) fn new(http: reqwest::Client, url: url::Url) -> Self {
        Self { http, url }
    }

    /// Fetch the profiles of the given user ids. Unknown ids are absent from
    /// the result. An empty input makes no request.
    pub async fn get_many<'a, I>(&self, ids: I) -> Result<Vec<ProfileRow>, BackendError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let filter = in_filter(ids);
        let Some(filter) = filter else {
            return Ok(Vec::new());
        };
        let endpoint = format!("GET /{PROFILES_PATH}");

        let resp = crate::retry::ReadRetry::STANDARD.run(|| {
            self.http
                .get(self.url.clone())
                .query(&[("select", "id,full_name,email"), ("id", filter.as_str())])
                .send()
        })
        .await
        .map_err(|e| BackendError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let resp = check_status(&endpoint, resp).await?;
        resp.json().await.map_err(|e| BackendError::Deserialization { endpoint, source: e })
    }
}

/// Build an `in.(...)` filter with each id double-quoted.
fn in_filter<'a, I>(ids: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let quoted: Vec<String> = ids
        .into_iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    if quoted.is_empty() {
        None
    } else {
        Some(format!("in.({})", quoted.join(",")))
    }
}

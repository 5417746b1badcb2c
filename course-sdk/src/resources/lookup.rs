//! Lookup resource client
//!
//! The `people`, `places`, `gps` and `apidb` endpoints. Replies are decoded
//! into per-endpoint sum types before they leave this module.

use crate::client::HttpClient;
use crate::error::{SdkError, SdkResult};
use course_core::{DbReply, GpsFix, LookupReply, NameList};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    apikey: &'a str,
    query: &'a str,
}

#[derive(Debug, Serialize)]
struct GpsRequest<'a> {
    apikey: &'a str,
    #[serde(rename = "userID")]
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct DbRequest<'a> {
    task: &'static str,
    apikey: &'a str,
    query: &'a str,
}

/// Client for the lookup APIs
#[derive(Debug, Clone)]
pub struct LookupClient {
    client: Arc<HttpClient>,
}

impl LookupClient {
    /// Create a new lookup client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Places where a person was seen
    pub async fn people(&self, name: &str) -> SdkResult<NameList> {
        let reply = self.query("/people", name).await?;
        Ok(NameList::decode(&reply.message))
    }

    /// People seen in a place
    pub async fn places(&self, place: &str) -> SdkResult<NameList> {
        let reply = self.query("/places", place).await?;
        Ok(NameList::decode(&reply.message))
    }

    /// Last known position of a user
    pub async fn gps(&self, user_id: i64) -> SdkResult<GpsFix> {
        let key = self.client.config().require_api_key()?;
        let body = GpsRequest {
            apikey: key.expose(),
            user_id,
        };
        let reply: LookupReply = self
            .post_lenient("/gps", &body, LookupReply::is_lookup_body)
            .await?;
        Ok(GpsFix::decode(&reply.message))
    }

    /// Run a read-only SQL query against the course database
    pub async fn database(&self, sql: &str) -> SdkResult<DbReply> {
        let key = self.client.config().require_api_key()?;
        let body = DbRequest {
            task: "database",
            apikey: key.expose(),
            query: sql,
        };
        debug!(sql, "Querying database API");
        let reply: DbReply = self.post_lenient("/apidb", &body, DbReply::is_db_body).await?;
        if !reply.is_ok() {
            return Err(SdkError::ApiError {
                status: 200,
                message: reply.error.unwrap_or_default(),
            });
        }
        Ok(reply)
    }

    async fn query(&self, path: &str, query: &str) -> SdkResult<LookupReply> {
        let key = self.client.config().require_api_key()?;
        let body = QueryRequest {
            apikey: key.expose(),
            query,
        };
        debug!(path, query, "Lookup");
        self.post_lenient(path, &body, LookupReply::is_lookup_body)
            .await
    }

    /// The lookup endpoints answer unknown or restricted keys with 4xx and a
    /// normal reply body. On a non-2xx status the body is only taken as a
    /// reply when `is_reply` recognises the endpoint's own fields.
    async fn post_lenient<T, B>(
        &self,
        path: &str,
        body: &B,
        is_reply: fn(&T) -> bool,
    ) -> SdkResult<T>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize,
    {
        let raw = self.client.post_raw(path, body).await?;
        match serde_json::from_str::<T>(&raw.body) {
            Ok(reply) if raw.is_success() || is_reply(&reply) => Ok(reply),
            Ok(_) => Err(SdkError::from_response(raw.status, &raw.body)),
            Err(_) if !raw.is_success() => Err(SdkError::from_response(raw.status, &raw.body)),
            Err(e) => Err(SdkError::SerializationError(e)),
        }
    }
}

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{Lead, LeadForm, LEADS_TABLE};

/// The two things the leads view needs from the hosted table.
#[async_trait(?Send)]
pub trait LeadStore {
    async fn fetch_all(&self) -> Result<Vec<Lead>, StoreError>;
    async fn insert_one(&self, lead: &LeadForm) -> Result<(), StoreError>;
}

/// Store handle shared through Leptos context.
pub type SharedStore = Rc<dyn LeadStore>;

/// Store configured from the environment. A missing URL or key is logged and
/// leaves the view running against a store that fails every call.
pub fn connect_store() -> SharedStore {
    match SupabaseStore::from_env() {
        Ok(store) => Rc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "lead store unavailable");
            Rc::new(UnavailableStore(e))
        }
    }
}

/// `leads` table on a Supabase project, spoken to over PostgREST.
pub struct SupabaseStore {
    client: Client,
    config: StoreConfig,
}

impl SupabaseStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { client: Client::new(), config }
    }

    pub fn from_env() -> Result<Self, StoreError> {
        StoreConfig::from_env().map(Self::new)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
    }

    fn list_request(&self) -> RequestBuilder {
        let url = self.config.table_url(LEADS_TABLE);
        self.authorized(self.client.get(url))
            .query(&[("select", "*")])
            .header("Accept", "application/json")
    }

    fn insert_request(&self, lead: &LeadForm) -> RequestBuilder {
        let url = self.config.table_url(LEADS_TABLE);
        self.authorized(self.client.post(url))
            .header("Prefer", "return=minimal")
            .json(&[lead])
    }
}

#[async_trait(?Send)]
impl LeadStore for SupabaseStore {
    async fn fetch_all(&self) -> Result<Vec<Lead>, StoreError> {
        tracing::debug!(table = LEADS_TABLE, "selecting all rows");
        let resp = check(self.list_request().send().await?).await?;
        let leads: Vec<Lead> = resp.json().await.map_err(|e| StoreError::Parse(e.to_string()))?;
        tracing::debug!(rows = leads.len(), "leads fetched");
        Ok(leads)
    }

    async fn insert_one(&self, lead: &LeadForm) -> Result<(), StoreError> {
        tracing::debug!(table = LEADS_TABLE, "inserting one row");
        check(self.insert_request(lead).send().await?).await?;
        Ok(())
    }
}

/// Store that could not be configured; every call fails with the same error.
pub struct UnavailableStore(pub StoreError);

#[async_trait(?Send)]
impl LeadStore for UnavailableStore {
    async fn fetch_all(&self) -> Result<Vec<Lead>, StoreError> {
        Err(self.0.clone())
    }

    async fn insert_one(&self, _lead: &LeadForm) -> Result<(), StoreError> {
        Err(self.0.clone())
    }
}

// PostgREST error body
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

async fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let fallback = status.canonical_reason().unwrap_or("Unknown error");
    Err(rejection(status.as_u16(), &body, fallback))
}

fn rejection(status: u16, body: &str, fallback: &str) -> StoreError {
    let message = match serde_json::from_str::<ApiError>(body) {
        Ok(err) => {
            let mut message = err.message;
            if let Some(code) = err.code {
                message = format!("{} [{}]", message, code);
            }
            for extra in [err.details, err.hint].into_iter().flatten() {
                message.push_str("; ");
                message.push_str(&extra);
            }
            message
        }
        Err(_) => fallback.to_string(),
    };
    StoreError::Rejected { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use reqwest::Method;

    fn store() -> SupabaseStore {
        SupabaseStore::new(StoreConfig::new("https://abc.supabase.co/", "anon-key"))
    }

    #[test]
    fn test_list_request() {
        let req = store().list_request().build().unwrap();

        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.url().as_str(), "https://abc.supabase.co/rest/v1/leads?select=*");
        assert_eq!(req.headers()["apikey"], "anon-key");
        assert_eq!(req.headers()["authorization"], "Bearer anon-key");
    }

    #[test]
    fn test_insert_request_sends_one_row() {
        let form = LeadForm {
            contact: "Acme".into(),
            field: "Sales".into(),
            name: "Jo".into(),
            address: "1 Rd".into(),
            doc_type: "W9".into(),
            appointment: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()),
        };
        let req = store().insert_request(&form).build().unwrap();

        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.url().as_str(), "https://abc.supabase.co/rest/v1/leads");
        assert_eq!(req.headers()["prefer"], "return=minimal");
        assert_eq!(req.headers()["content-type"], "application/json");

        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        let sent: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent, serde_json::to_value([&form]).unwrap());
        assert_eq!(sent[0]["docType"], "W9");
    }

    #[test]
    fn test_rejection_reads_postgrest_error() {
        let body = r#"{"message":"relation \"public.leads\" does not exist","code":"42P01","details":null,"hint":null}"#;
        assert_eq!(
            rejection(404, body, "Not Found"),
            StoreError::Rejected {
                status: 404,
                message: "relation \"public.leads\" does not exist [42P01]".into(),
            }
        );
    }

    #[test]
    fn test_rejection_falls_back_to_reason() {
        assert_eq!(
            rejection(502, "<html>bad gateway</html>", "Bad Gateway"),
            StoreError::Rejected { status: 502, message: "Bad Gateway".into() }
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let err = StoreError::Config("LEADS_SUPABASE_URL is not set".into());
        let store = UnavailableStore(err.clone());

        assert_eq!(store.fetch_all().await, Err(err.clone()));
        assert_eq!(store.insert_one(&LeadForm::default()).await, Err(err));
    }
}

//! API client for the loan management backend.
//!
//! Every protected call goes through `send_authorized`, which runs the
//! session guard and attaches the bearer token. Nothing is retried: a
//! failure is reported once and the user decides what to do next.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{multipart, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{Credential, SessionGuard};
use crate::models::{
    ApprovalResult, Customer, CustomerOverview, CustomerProfile, CustomerResponse,
    CustomersResponse, Dashboard, LoanPackage, LoginResponse, MutationAck, PackageOverview,
    PackageResponse, PackageTerms, PackagesResponse, Recommendation, Registration,
    RegistrationAck,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the loan backend.
/// Clone is cheap - reqwest::Client and the session share their state.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionGuard,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, session: SessionGuard) -> Result<Self> {
        Self::with_timeout(
            base_url,
            session,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(base_url: &str, session: SessionGuard, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Account =====

    /// Log in with the bank id and password, storing the issued token.
    pub async fn login(&self, bank_id: &str, password: &str) -> Result<Credential> {
        let url = self.url("/login");
        let response = self
            .client
            .post(&url)
            .form(&[("username", bank_id), ("password", password)])
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send login request")?;

        let response = Self::check_response(response, "Invalid credentials").await?;
        let login: LoginResponse = Self::parse_json(response, &url).await?;

        let credential = Credential::parse(&login.access_token).map_err(|e| {
            ApiError::InvalidResponse(format!("login returned an undecodable token: {}", e))
        })?;
        self.session.store_token(credential.encoded())?;

        info!(bank_id = bank_id, expiry = credential.expiry(), "Logged in");
        Ok(credential)
    }

    /// Register a new bank account with its proof document.
    pub async fn register(&self, registration: &Registration) -> Result<RegistrationAck> {
        let url = self.url("/register");
        let contents = tokio::fs::read(&registration.document)
            .await
            .with_context(|| {
                format!(
                    "Failed to read registration document {}",
                    registration.document.display()
                )
            })?;
        let file_name = registration
            .document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let form = multipart::Form::new()
            .text("id", registration.id.clone())
            .text("name", registration.name.clone())
            .text("password", registration.password.clone())
            .part("file", multipart::Part::bytes(contents).file_name(file_name));

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send registration request")?;

        let response = Self::check_response(response, "Registration failed").await?;
        Self::parse_json(response, &url).await
    }

    /// Drop the local session. The backend is told as a courtesy; its
    /// answer does not matter.
    pub async fn logout(&self) -> Result<()> {
        let url = self.url("/logout");
        match self.client.post(&url).send().await {
            Ok(response) if !response.status().is_success() => {
                debug!(status = %response.status(), "Logout request rejected");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Logout request failed"),
        }
        self.session.clear()
    }

    // ===== Dispatch =====

    /// Send a protected request: check the session, attach the bearer
    /// token and translate failures.
    ///
    /// Without a valid session no request is sent at all. A 401 from the
    /// backend clears the stored token, same as local expiry.
    async fn send_authorized(&self, request: RequestBuilder, fallback: &str) -> Result<Response> {
        self.session
            .guard(|credential| async move {
                let response = request
                    .bearer_auth(credential.encoded())
                    .send()
                    .await
                    .map_err(ApiError::from)?;

                if response.status() == StatusCode::UNAUTHORIZED {
                    warn!("Backend rejected the session token, clearing it");
                    if let Err(e) = self.session.clear() {
                        warn!(error = %e, "Failed to clear rejected token");
                    }
                    return Err(ApiError::LoginRequired.into());
                }

                Self::check_response(response, fallback).await
            })
            .await
    }

    /// Check if response is successful, returning an error with the
    /// backend's detail if not.
    async fn check_response(response: Response, fallback: &str) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Request rejected");
            Err(ApiError::from_status(status, &body, fallback).into())
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        let text = response.text().await.map_err(ApiError::from)?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
                .into()
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .send_authorized(self.client.get(&url), fallback)
            .await
            .with_context(|| format!("GET {}", path))?;
        Self::parse_json(response, &url).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T> {
        let url = self.url(path);
        let request = self.client.request(method.clone(), &url).json(body);
        let response = self
            .send_authorized(request, fallback)
            .await
            .with_context(|| format!("{} {}", method, path))?;
        Self::parse_json(response, &url).await
    }

    async fn delete(&self, path: &str, fallback: &str) -> Result<MutationAck> {
        let url = self.url(path);
        let response = self
            .send_authorized(self.client.delete(&url), fallback)
            .await
            .with_context(|| format!("DELETE {}", path))?;
        Self::parse_json(response, &url).await
    }

    // ===== Customers =====

    pub async fn fetch_customers(&self) -> Result<Vec<Customer>> {
        let response: CustomersResponse = self.get("/customers", "Error fetching customers").await?;
        debug!(count = response.customers.len(), "Fetched customers");
        Ok(response.customers)
    }

    pub async fn fetch_customer(&self, customer_id: i64) -> Result<Customer> {
        let path = format!("/customer/{}", customer_id);
        let response: CustomerResponse = self.get(&path, "Error fetching customer data").await?;
        Ok(response.customer)
    }

    pub async fn add_customer(&self, profile: &CustomerProfile) -> Result<MutationAck> {
        self.send_json(Method::POST, "/customer", profile, "Error adding customer")
            .await
    }

    pub async fn update_customer(
        &self,
        customer_id: i64,
        profile: &CustomerProfile,
    ) -> Result<MutationAck> {
        let path = format!("/customer/{}", customer_id);
        self.send_json(Method::PUT, &path, profile, "Error updating customer")
            .await
    }

    pub async fn delete_customer(&self, customer_id: i64) -> Result<MutationAck> {
        let path = format!("/customer/{}", customer_id);
        self.delete(&path, "Error deleting customer").await
    }

    /// Ask the backend whether the customer qualifies for the loan.
    /// The decision is made server-side; nothing is stored.
    pub async fn check_approval_status(
        &self,
        customer_id: i64,
        profile: &CustomerProfile,
    ) -> Result<ApprovalResult> {
        let path = format!("/check_approval_status/{}", customer_id);
        self.send_json(Method::PUT, &path, profile, "Failed to check approval status")
            .await
    }

    /// Packages the backend recommends for an approved customer.
    pub async fn recommend_packages(
        &self,
        customer_id: i64,
        profile: &CustomerProfile,
    ) -> Result<Recommendation> {
        let path = format!("/recommend_loan_package/{}", customer_id);
        self.send_json(Method::PUT, &path, profile, "Error recommending loan packages")
            .await
    }

    // ===== Loan packages =====

    pub async fn fetch_packages(&self) -> Result<Vec<LoanPackage>> {
        let response: PackagesResponse =
            self.get("/loan_packages", "Error fetching packages").await?;
        debug!(count = response.packages.len(), "Fetched loan packages");
        Ok(response.packages)
    }

    pub async fn fetch_package(&self, package_id: i64) -> Result<LoanPackage> {
        let path = format!("/loan_package/{}", package_id);
        let response: PackageResponse = self.get(&path, "Error fetching package data").await?;
        Ok(response.package)
    }

    pub async fn add_package(&self, terms: &PackageTerms) -> Result<MutationAck> {
        self.send_json(Method::POST, "/loan_package", terms, "Error adding package")
            .await
    }

    pub async fn update_package(
        &self,
        package_id: i64,
        terms: &PackageTerms,
    ) -> Result<MutationAck> {
        let path = format!("/loan_package/{}", package_id);
        self.send_json(Method::PUT, &path, terms, "Error updating package")
            .await
    }

    pub async fn delete_package(&self, package_id: i64) -> Result<MutationAck> {
        let path = format!("/loan_package/{}", package_id);
        self.delete(&path, "Error deleting package").await
    }

    // ===== Overview =====

    pub async fn fetch_customer_overview(&self) -> Result<CustomerOverview> {
        self.get("/customers/overview", "Error fetching customer overview")
            .await
    }

    pub async fn fetch_package_overview(&self) -> Result<PackageOverview> {
        self.get("/packages/overview", "Error fetching package overview")
            .await
    }

    /// Fetch both overviews concurrently. A lost session fails the whole
    /// dashboard, as does losing both halves; otherwise a failure only
    /// blanks its half.
    pub async fn fetch_dashboard(&self) -> Result<Dashboard> {
        if !self.session.is_authenticated() {
            return Err(ApiError::LoginRequired.into());
        }

        let (customers, packages) = futures::join!(
            self.fetch_customer_overview(),
            self.fetch_package_overview()
        );

        let mut dashboard = Dashboard::default();
        let mut first_error = None;
        match customers {
            Ok(overview) => dashboard.customers = Some(overview),
            Err(e) => Self::record_dashboard_error(&mut dashboard, &mut first_error, e)?,
        }
        match packages {
            Ok(overview) => dashboard.packages = Some(overview),
            Err(e) => Self::record_dashboard_error(&mut dashboard, &mut first_error, e)?,
        }

        match first_error {
            Some(err) if dashboard.customers.is_none() && dashboard.packages.is_none() => Err(err),
            _ => Ok(dashboard),
        }
    }

    fn record_dashboard_error(
        dashboard: &mut Dashboard,
        first_error: &mut Option<anyhow::Error>,
        err: anyhow::Error,
    ) -> Result<()> {
        let message = match err.downcast_ref::<ApiError>() {
            Some(ApiError::LoginRequired) => return Err(err),
            Some(api) => api.user_message(),
            None => format!("{:#}", err),
        };
        dashboard.errors.push(message);
        if first_error.is_none() {
            *first_error = Some(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::token::mint_token;
    use crate::auth::{MemoryTokenStore, TokenStore};

    fn client_with(server_url: &str, token: Option<String>) -> (ApiClient, Arc<MemoryTokenStore>) {
        let store = Arc::new(match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        });
        let client = ApiClient::new(server_url, SessionGuard::from_store(store.clone())).unwrap();
        (client, store)
    }

    fn valid_token() -> String {
        mint_token(Utc::now().timestamp() + 3600)
    }

    fn api_error(err: &anyhow::Error) -> &ApiError {
        err.downcast_ref::<ApiError>().expect("expected an ApiError")
    }

    fn customer_json(id: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": "Jane Doe",
            "is_employed": true,
            "income": 85000.0,
            "is_graduated": true,
            "residential_assets": 120000.0,
            "commercial_assets": 0.0,
            "luxury_assets": 0.0,
            "bank_assets": 30000.0,
            "credit_score": 742,
            "loan_amount": 250000.0,
            "loan_term": 20,
            "approval_status": true,
            "bank_id": "acme-bank"
        })
    }

    #[tokio::test]
    async fn test_no_request_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (client, _store) = client_with(&server.uri(), None);
        let err = client.fetch_customers().await.unwrap_err();
        assert!(api_error(&err).is_login_required());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_sends_nothing_and_clears_token() {
        let server = MockServer::start().await;
        let expired = mint_token(Utc::now().timestamp() - 10);
        let (client, store) = client_with(&server.uri(), Some(expired));

        let err = client.delete_customer(3).await.unwrap_err();
        assert!(api_error(&err).is_login_required());
        assert_eq!(store.get().unwrap(), None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let server = MockServer::start().await;
        let token = valid_token();
        Mock::given(method("GET"))
            .and(path("/customers"))
            .and(header("Authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "customers": [customer_json(1), customer_json(2)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, store) = client_with(&server.uri(), Some(token.clone()));
        let customers = client.fetch_customers().await.unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[1].id, 2);
        assert_eq!(store.get().unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_backend_401_forces_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loan_packages"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Could not validate credentials"})),
            )
            .mount(&server)
            .await;

        let (client, store) = client_with(&server.uri(), Some(valid_token()));
        let err = client.fetch_packages().await.unwrap_err();
        assert!(api_error(&err).is_login_required());
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejection_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customer/9"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"detail": "No customer with id 9 found"})),
            )
            .mount(&server)
            .await;

        let (client, store) = client_with(&server.uri(), Some(valid_token()));
        let err = client.fetch_customer(9).await.unwrap_err();
        assert_eq!(api_error(&err).user_message(), "No customer with id 9 found");
        assert!(store.get().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejection_without_detail_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/loan_package/5"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let (client, _store) = client_with(&server.uri(), Some(valid_token()));
        let err = client.delete_package(5).await.unwrap_err();
        assert_eq!(api_error(&err).user_message(), "Error deleting package");
    }

    #[tokio::test]
    async fn test_transport_failure_is_generic() {
        // Nothing listens on port 1
        let (client, _store) = client_with("http://127.0.0.1:1", Some(valid_token()));
        let err = client.fetch_customers().await.unwrap_err();
        let api = api_error(&err);
        assert!(matches!(api, ApiError::NetworkError(_)));
        assert_eq!(api.user_message(), crate::api::error::GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        let token = valid_token();
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("username=acme-bank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": token,
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, store) = client_with(&server.uri(), None);
        let credential = client.login("acme-bank", "hunter2").await.unwrap();
        assert_eq!(credential.subject(), Some("acme-bank"));
        assert_eq!(store.get().unwrap(), Some(token));
        assert!(client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_failure_is_not_login_required() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let (client, store) = client_with(&server.uri(), None);
        let err = client.login("acme-bank", "wrong").await.unwrap_err();
        let api = api_error(&err);
        assert!(!api.is_login_required());
        assert_eq!(api.user_message(), "Invalid credentials");
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_register_uploads_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .and(body_string_contains("proof.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Bank registered successfully",
                "name": "Acme Bank"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("proof.pdf");
        std::fs::write(&document, b"%PDF-1.4").unwrap();

        let (client, _store) = client_with(&server.uri(), None);
        let ack = client
            .register(&Registration {
                id: "acme-bank".to_string(),
                name: "Acme Bank".to_string(),
                password: "hunter2".to_string(),
                document,
            })
            .await
            .unwrap();
        assert_eq!(ack.name.as_deref(), Some("Acme Bank"));
    }

    #[tokio::test]
    async fn test_approval_check_and_recommendation() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/check_approval_status/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "approval_status": true,
                "message": "Customer Jane Doe is eligible for getting loan."
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/recommend_loan_package/1"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "detail": "Customer with id 1 is not eligible for getting loan!"
            })))
            .mount(&server)
            .await;

        let (client, _store) = client_with(&server.uri(), Some(valid_token()));
        let customer: Customer = serde_json::from_value(customer_json(1)).unwrap();

        let result = client.check_approval_status(1, &customer.profile).await.unwrap();
        assert!(result.approval_status);
        assert!(result.message.contains("eligible"));

        let err = client.recommend_packages(1, &customer.profile).await.unwrap_err();
        assert_eq!(
            api_error(&err).user_message(),
            "Customer with id 1 is not eligible for getting loan!"
        );
    }

    #[tokio::test]
    async fn test_package_delete_ack() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/loan_package/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Package deleted successfully",
                "customer_id": 4
            })))
            .mount(&server)
            .await;

        let (client, _store) = client_with(&server.uri(), Some(valid_token()));
        let ack = client.delete_package(4).await.unwrap();
        assert_eq!(ack.id, Some(4));
    }

    #[tokio::test]
    async fn test_dashboard_keeps_partial_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers/overview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_customers": 12,
                "loan_approved_customers": 5,
                "latest_customer": "Jane Doe"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/packages/overview"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (client, _store) = client_with(&server.uri(), Some(valid_token()));
        let dashboard = client.fetch_dashboard().await.unwrap();
        assert_eq!(dashboard.customers.unwrap().total_customers, 12);
        assert!(dashboard.packages.is_none());
        assert_eq!(dashboard.errors, vec!["Error fetching package overview".to_string()]);
    }

    #[tokio::test]
    async fn test_dashboard_fails_when_both_halves_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers/overview"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"detail": "Database unavailable"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/packages/overview"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (client, _store) = client_with(&server.uri(), Some(valid_token()));
        let err = client.fetch_dashboard().await.unwrap_err();
        assert_eq!(api_error(&err).user_message(), "Database unavailable");
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_if_backend_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (client, store) = client_with(&server.uri(), Some(valid_token()));
        client.logout().await.unwrap();
        assert_eq!(store.get().unwrap(), None);
    }
}

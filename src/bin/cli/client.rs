use assetdesk::cron::SweepReport;
use assetdesk::dto::{Dashboard, DepreciationReport, LoginDto, LoginResponse, OverdueCheckout};
use assetdesk::models::{Asset, AssetStatus, Inventory};
use reqwest::{Client, Method, RequestBuilder};

/// Error type for CLI client operations
#[derive(Debug)]
pub enum ClientError {
    /// Server returned an error status with a message body
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    Request(reqwest::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status.as_u16(), message)
            }
            ClientError::Request(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) => Some(err),
            ClientError::Server { .. } => None,
        }
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<serde_json::Value>().await {
            Ok(body) => body.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

/// HTTP client wrapper for communicating with the assetdesk server
pub struct AssetdeskClient {
    /// The base URL of the server (e.g. "http://localhost:3000")
    base_url: String,
    /// Session token sent as a bearer token, if signed in
    token: Option<String>,
    /// The underlying HTTP client
    client: Client,
}

impl AssetdeskClient {
    /// Creates a new AssetdeskClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the assetdesk server
    /// * `token` - Session token from an earlier `login`
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    /// Starts a request to an `/api` path, carrying the session token
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/api{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and decodes the JSON body of a successful response
    async fn send<T: serde::de::DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Signs in and returns the user with a fresh session token
    pub async fn login(&self, email: String, password: String) -> Result<LoginResponse, ClientError> {
        let dto = LoginDto { email, password };
        self.send(self.request(Method::POST, "/login").json(&dto)).await
    }

    // ── Assets ───────────────────────────────────────────────────────

    /// Lists assets, optionally by status and a name/serial search
    pub async fn list_assets(
        &self,
        status: Option<AssetStatus>,
        search: Option<&str>,
    ) -> Result<Vec<Asset>, ClientError> {
        let mut params: Vec<(&'static str, String)> = Vec::new();
        if let Some(status) = status {
            params.push(("status", status.to_string()));
        }
        if let Some(search) = search {
            params.push(("search", search.to_string()));
        }
        self.send(self.request(Method::GET, "/assets").query(&params)).await
    }

    /// Gets a specific asset by ID
    pub async fn get_asset(&self, id: &str) -> Result<Asset, ClientError> {
        self.send(self.request(Method::GET, &format!("/assets/{}", id))).await
    }

    // ── Inventory ────────────────────────────────────────────────────

    /// Lists inventory, optionally only items at or below their minimum
    pub async fn list_inventory(&self, low_stock: bool) -> Result<Vec<Inventory>, ClientError> {
        let mut builder = self.request(Method::GET, "/inventory");
        if low_stock {
            builder = builder.query(&[("low_stock", "true")]);
        }
        self.send(builder).await
    }

    // ── Reports ──────────────────────────────────────────────────────

    /// Fetches today's depreciation report
    pub async fn depreciation_report(&self) -> Result<DepreciationReport, ClientError> {
        self.send(self.request(Method::GET, "/reports/depreciation")).await
    }

    /// Fetches the open checkouts past their expected return
    pub async fn overdue_checkouts(&self) -> Result<Vec<OverdueCheckout>, ClientError> {
        self.send(self.request(Method::GET, "/reports/overdue-checkouts")).await
    }

    /// Fetches the dashboard figures
    pub async fn dashboard(&self) -> Result<Dashboard, ClientError> {
        self.send(self.request(Method::GET, "/dashboard")).await
    }

    // ── Cron ─────────────────────────────────────────────────────────

    /// Runs the sweep once on the server
    pub async fn run_cron(&self) -> Result<SweepReport, ClientError> {
        self.send(self.request(Method::POST, "/cron")).await
    }
}

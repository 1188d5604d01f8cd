use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PaystackConfig,
    data_objects::{InitializeTransaction, PaystackResponse, TransactionAuthorization},
    PaystackApiError,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                PaystackApiError::Unreachable(e.to_string())
            } else {
                PaystackApiError::RestRequestError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PaystackApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
            Err(PaystackApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Opens a new transaction with Paystack and returns the hosted checkout URL the shopper must visit.
    ///
    /// If `request.callback_url` is empty, the configured callback URL (if any) is used.
    pub async fn initialize_transaction(
        &self,
        mut request: InitializeTransaction,
    ) -> Result<TransactionAuthorization, PaystackApiError> {
        if request.callback_url.is_none() {
            request.callback_url = self.config.callback_url.clone();
        }
        debug!("Initializing Paystack transaction {} for {}", request.reference, request.amount);
        let response = self
            .rest_query::<PaystackResponse<TransactionAuthorization>, _>(
                Method::POST,
                "/transaction/initialize",
                Some(request),
            )
            .await?;
        match response {
            PaystackResponse { status: true, data: Some(auth), .. } => {
                info!("Paystack transaction {} initialized", auth.reference);
                Ok(auth)
            },
            PaystackResponse { message, .. } => {
                warn!("Paystack declined transaction initialization: {message}");
                Err(PaystackApiError::Declined(message))
            },
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::{CoreError, CoreResult},
    protocol::{GraphqlRequest, GraphqlResponse},
};
use tracing::debug;
use url::Url;

/// Delivers one GraphQL request and hands back the decoded envelope.
///
/// Implementations report connection trouble as `NetworkError` and anything the
/// endpoint answered but could not be understood as `ProtocolError`. Timeouts
/// and retries, if any, belong here rather than in the query client.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, request: &GraphqlRequest) -> CoreResult<GraphqlResponse>;
}

pub struct HttpGraphqlTransport {
    http: Client,
    endpoint: Url,
}

impl HttpGraphqlTransport {
    pub fn new(endpoint: Url, timeout: Duration) -> CoreResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CoreError::network(format!("failed to build http client: {err}")))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl GraphqlTransport for HttpGraphqlTransport {
    async fn execute(&self, request: &GraphqlRequest) -> CoreResult<GraphqlResponse> {
        debug!(
            endpoint = %self.endpoint,
            operation = request.operation_name,
            "posting graphql request"
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| CoreError::network(format!("request to {} failed: {err}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::protocol(format!(
                "endpoint {} answered with status {status}",
                self.endpoint
            )));
        }

        response
            .json::<GraphqlResponse>()
            .await
            .map_err(|err| CoreError::protocol(format!("invalid graphql response body: {err}")))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

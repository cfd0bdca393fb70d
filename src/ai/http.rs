use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    EnhanceResponse, EraseBackgroundResponse, ImageTransformService, InpaintRequest,
    InpaintResponse, PhotoRequest, TransformServiceError, TransformServiceResult,
};

/// Flow identifiers appended to the endpoint. Missing config keys keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlowNames {
    pub enhance: String,
    pub erase_background: String,
    pub inpaint: String,
}

impl Default for FlowNames {
    fn default() -> Self {
        Self {
            enhance: "enhancePhotoFlow".to_string(),
            erase_background: "removeBackgroundFlow".to_string(),
            inpaint: "inpaintImageFlow".to_string(),
        }
    }
}

#[derive(Serialize)]
struct FlowRequest<'a, T> {
    data: &'a T,
}

#[derive(Deserialize)]
struct FlowResponse<T> {
    result: T,
}

/// Talks to a flow server: `POST {endpoint}/{flow}` with `{"data": ...}`,
/// answered by `{"result": ...}`.
#[derive(Debug, Clone)]
pub struct HttpTransformService {
    client: reqwest::Client,
    endpoint: String,
    flows: FlowNames,
}

impl HttpTransformService {
    pub fn new(endpoint: impl Into<String>) -> TransformServiceResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("Phantasia/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransformServiceError::Request {
                operation: "client setup",
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            flows: FlowNames::default(),
        })
    }

    pub fn with_flows(mut self, flows: FlowNames) -> Self {
        self.flows = flows;
        self
    }

    pub fn flow_url(&self, flow: &str) -> String {
        format!("{}/{}", self.endpoint, flow)
    }

    async fn call<Req, Resp>(
        &self,
        operation: &'static str,
        flow: &str,
        request: &Req,
    ) -> TransformServiceResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.flow_url(flow);
        tracing::info!(operation, %url, "calling transform service");
        let response = self
            .client
            .post(&url)
            .json(&FlowRequest { data: request })
            .send()
            .await
            .map_err(|e| TransformServiceError::Request {
                operation,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            tracing::warn!(operation, status = %response.status(), "transform service rejected request");
            return Err(TransformServiceError::Status {
                operation,
                status: response.status().as_u16(),
            });
        }

        let body: FlowResponse<Resp> =
            response
                .json()
                .await
                .map_err(|e| TransformServiceError::Request {
                    operation,
                    message: e.to_string(),
                })?;
        Ok(body.result)
    }
}

impl ImageTransformService for HttpTransformService {
    async fn enhance(&self, request: PhotoRequest) -> TransformServiceResult<EnhanceResponse> {
        self.call::<_, EnhanceResponse>("enhance", &self.flows.enhance, &request)
            .await?
            .validate()
    }

    async fn erase_background(
        &self,
        request: PhotoRequest,
    ) -> TransformServiceResult<EraseBackgroundResponse> {
        self.call::<_, EraseBackgroundResponse>(
            "erase background",
            &self.flows.erase_background,
            &request,
        )
        .await?
        .validate()
    }

    async fn inpaint(&self, request: InpaintRequest) -> TransformServiceResult<InpaintResponse> {
        self.call::<_, InpaintResponse>("inpaint", &self.flows.inpaint, &request)
            .await?
            .validate()
    }
}

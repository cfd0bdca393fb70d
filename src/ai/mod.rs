//! Contract with the remote image-transform collaborator (enhance, background
//! removal, inpainting). Images cross the boundary as data URIs.

mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::{FlowNames, HttpTransformService};

#[derive(Debug, Error)]
pub enum TransformServiceError {
    #[error("{operation} request failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} returned HTTP status {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("{operation} returned no {missing}")]
    MissingOutput {
        operation: &'static str,
        missing: &'static str,
    },
    #[error("no transform service endpoint is configured")]
    NotConfigured,
}

pub type TransformServiceResult<T> = std::result::Result<T, TransformServiceError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRequest {
    pub photo_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InpaintRequest {
    pub photo_data_uri: String,
    /// Binary mask: white marks the region to fill.
    pub mask_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    #[serde(default)]
    pub enhanced_photo_data_uri: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EraseBackgroundResponse {
    #[serde(default, alias = "backgroundRemovedPhotoDataUri")]
    pub photo_with_transparent_background: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InpaintResponse {
    #[serde(default)]
    pub inpainted_photo_data_uri: String,
}

fn require(
    value: &str,
    operation: &'static str,
    missing: &'static str,
) -> TransformServiceResult<()> {
    if value.trim().is_empty() {
        Err(TransformServiceError::MissingOutput { operation, missing })
    } else {
        Ok(())
    }
}

impl EnhanceResponse {
    /// Both the image and the explanation are mandatory.
    pub fn validate(self) -> TransformServiceResult<Self> {
        require(&self.enhanced_photo_data_uri, "enhance", "image")?;
        require(&self.reasoning, "enhance", "reasoning")?;
        Ok(self)
    }
}

impl EraseBackgroundResponse {
    pub fn validate(self) -> TransformServiceResult<Self> {
        require(&self.photo_with_transparent_background, "erase background", "image")?;
        Ok(self)
    }
}

impl InpaintResponse {
    pub fn validate(self) -> TransformServiceResult<Self> {
        require(&self.inpainted_photo_data_uri, "inpaint", "image")?;
        Ok(self)
    }
}

/// Remote collaborator. Each call has a single terminal outcome and is never
/// retried; implementations return validated responses.
pub trait ImageTransformService {
    fn enhance(
        &self,
        request: PhotoRequest,
    ) -> impl Future<Output = TransformServiceResult<EnhanceResponse>> + Send;

    fn erase_background(
        &self,
        request: PhotoRequest,
    ) -> impl Future<Output = TransformServiceResult<EraseBackgroundResponse>> + Send;

    fn inpaint(
        &self,
        request: InpaintRequest,
    ) -> impl Future<Output = TransformServiceResult<InpaintResponse>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_serialize_with_camel_case_fields() {
        let request = InpaintRequest {
            photo_data_uri: "data:image/png;base64,AA==".to_string(),
            mask_data_uri: "data:image/png;base64,AQ==".to_string(),
        };
        let json = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(json["photoDataUri"], "data:image/png;base64,AA==");
        assert_eq!(json["maskDataUri"], "data:image/png;base64,AQ==");
    }

    #[test]
    fn erase_background_accepts_either_field_name() {
        let primary: EraseBackgroundResponse =
            serde_json::from_str(r#"{"photoWithTransparentBackground":"data:a"}"#)
                .expect("primary field should parse");
        let alias: EraseBackgroundResponse =
            serde_json::from_str(r#"{"backgroundRemovedPhotoDataUri":"data:b"}"#)
                .expect("alias should parse");
        assert_eq!(primary.photo_with_transparent_background, "data:a");
        assert_eq!(alias.photo_with_transparent_background, "data:b");
    }

    #[test]
    fn enhance_without_reasoning_is_rejected() {
        let response: EnhanceResponse =
            serde_json::from_str(r#"{"enhancedPhotoDataUri":"data:x"}"#).expect("should parse");
        assert!(matches!(
            response.validate(),
            Err(TransformServiceError::MissingOutput {
                missing: "reasoning",
                ..
            })
        ));
    }

    #[test]
    fn empty_inpaint_output_is_rejected() {
        assert!(InpaintResponse::default().validate().is_err());
    }
}

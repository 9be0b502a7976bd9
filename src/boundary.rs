//! Boundary envelope: the JSON shape and status codes a request handler
//! returns.
//!
//! The HTTP server itself (routes, multipart parsing, CORS) is an external
//! collaborator; what lives here is the mapping every such collaborator
//! needs to agree on:
//!
//! | condition                    | HTTP | body |
//! |------------------------------|------|------|
//! | empty LinkMap                | 400  | `Bad request: empty image urls` |
//! | zero images resolved         | 404  | `No images found` |
//! | any other failure            | 500  | raw error text |
//! | success                      | 200  | `{status, message, images}` |
//!
//! The CLI uses the same mapping for `--json` output and exit codes, so
//! library, CLI, and any future server agree on the contract.

use crate::collage::CollageOutput;
use crate::error::CollageError;
use crate::pipeline::encode::EncodedImage;
use serde::{Deserialize, Serialize};

/// The response body: `{status, message, images}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollageResponse {
    pub status: String,
    pub message: String,
    pub images: Vec<EncodedImage>,
}

/// A boundary reply: HTTP status code plus body.
#[derive(Debug, Clone)]
pub struct BoundaryReply {
    pub code: u16,
    pub body: CollageResponse,
}

impl BoundaryReply {
    fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            body: CollageResponse {
                status: "error".to_string(),
                message: message.into(),
                images: Vec::new(),
            },
        }
    }
}

/// Reject an empty mapping before any work happens.
///
/// Call this with the parsed `links` field; `None` means proceed.
pub fn reject_empty_links(links_len: usize) -> Option<BoundaryReply> {
    if links_len == 0 {
        Some(BoundaryReply::error(400, CollageError::EmptyLinkMap.to_string()))
    } else {
        None
    }
}

/// Map a compose result to the boundary reply.
pub fn map_compose_result(result: Result<CollageOutput, CollageError>) -> BoundaryReply {
    match result {
        Ok(output) => BoundaryReply {
            code: 200,
            body: CollageResponse {
                status: "success".to_string(),
                message: "Image uploaded and processed".to_string(),
                images: output.images,
            },
        },
        // "No images found" is a not-found condition, not a server fault.
        Err(CollageError::NoImagesResolved { .. }) => BoundaryReply::error(404, "No images found"),
        Err(CollageError::EmptyLinkMap) => {
            BoundaryReply::error(400, CollageError::EmptyLinkMap.to_string())
        }
        Err(e) => BoundaryReply::error(500, e.to_string()),
    }
}

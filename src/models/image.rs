use serde::{Deserialize, Serialize};

/// Body of a successful upload batch. Paths are directory-relative and in
/// request order, ready to be attached to a listing record by the caller.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub count: usize,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCodeResponse {
    pub listing_code: String,
}

use std::sync::Arc;
use uuid::Uuid;

use crate::models::Principal;
use crate::services::access::ViewAuthority;
use crate::services::error::ServiceError;
use crate::services::storage::BlobStore;
use crate::utils::image::content_type_for;

pub struct SubmissionContent {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

/// Streams stored bytes, gated by the same view check as metadata reads.
#[derive(Clone)]
pub struct ContentService {
    authority: Arc<dyn ViewAuthority>,
    blobs: Arc<dyn BlobStore>,
}

impl ContentService {
    pub fn new(authority: Arc<dyn ViewAuthority>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { authority, blobs }
    }

    pub async fn read(
        &self,
        submission_id: Uuid,
        principal: &Principal,
    ) -> Result<SubmissionContent, ServiceError> {
        let submission = self
            .authority
            .authorize_view(submission_id, principal)
            .await?;

        let bytes = self.blobs.read(&submission.file_path).await?;

        Ok(SubmissionContent {
            bytes,
            content_type: content_type_for(&submission.file_name),
            file_name: submission.file_name,
        })
    }
}

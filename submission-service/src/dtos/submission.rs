use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart body of an upload: the target activity and one image file.
#[derive(Debug, ToSchema)]
pub struct UploadSubmissionForm {
    pub activity_id: Uuid,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

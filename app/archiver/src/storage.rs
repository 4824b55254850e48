use framework::exception::CoreRsResult;
use tokio::fs::File;

pub const CAPABILITY_CHECK_FAILED: &str = "CAPABILITY_CHECK_FAILED";
pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";

/// Remote folder files are archived into.
pub trait Folder {
    fn id(&self) -> &str;

    /// Preflight check that a file with `name` and `size` could be uploaded, nothing is created.
    async fn can_upload(&self, name: &str, size: u64) -> CoreRsResult<()>;

    /// Uploads the whole content of `file`, the handle is dropped once the call returns.
    async fn upload(&self, file: File, name: &str) -> CoreRsResult<UploadReceipt>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub file_id: String,
    pub name: String,
}

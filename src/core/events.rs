use crate::core::model::DownloadRequest;
use crate::core::status::DownloadStatus;
use uuid::Uuid;

pub type SubmissionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Resolution,
    Format,
    AudioOnly,
    AudioFormat,
}

#[derive(Debug, Clone)]
pub enum FormEvent {
    FieldChanged { field: Field },
    Submitted { submission_id: SubmissionId, request: DownloadRequest },
    BusyChanged { busy: bool },
    StatusChanged { status: DownloadStatus },
}

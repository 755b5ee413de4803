use serde::{Deserialize, Serialize};

/// The service-specific half of a scan: which events to ask for and how
/// a resource identifier appears inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceProfile {
    /// Short tag used for output directories and file names.
    pub tag: &'static str,
    /// `eventSource` value pushed to the query service as a lookup filter.
    pub event_source: &'static str,
    /// Resource type whose name is matched against the identifier.
    pub resource_type: &'static str,
    /// `requestParameters` field holding the identifier.
    pub identifier_field: &'static str,
    /// Label for the identifier in headers.
    pub identifier_label: &'static str,
}

impl ServiceProfile {
    pub const KMS: ServiceProfile = ServiceProfile {
        tag: "kms",
        event_source: "kms.amazonaws.com",
        resource_type: "AWS::KMS::Key",
        identifier_field: "keyId",
        identifier_label: "KMS Key",
    };

    pub const S3: ServiceProfile = ServiceProfile {
        tag: "s3",
        event_source: "s3.amazonaws.com",
        resource_type: "AWS::S3::Bucket",
        identifier_field: "bucketName",
        identifier_label: "S3 Bucket",
    };
}

/// On-disk export format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Human-readable blocks separated by a dashed line
    #[default]
    Text,
    /// Pretty-printed JSON objects, one after another
    Json,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

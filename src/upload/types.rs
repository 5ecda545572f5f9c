//! 上传类型及其约束

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadType {
    ProfilePhoto,
    TalentCertificate,
}

impl UploadType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProfilePhoto => "profile_photo",
            Self::TalentCertificate => "talent_certificate",
        }
    }

    /// 允许的最大字节数
    #[must_use]
    pub const fn max_size(self) -> u64 {
        match self {
            Self::ProfilePhoto => 2 * MB,
            Self::TalentCertificate => 10 * MB,
        }
    }

    #[must_use]
    pub const fn allowed_content_types(self) -> &'static [&'static str] {
        match self {
            Self::ProfilePhoto => &["image/jpeg", "image/png", "image/webp"],
            Self::TalentCertificate => &["application/pdf", "image/jpeg", "image/png"],
        }
    }

    #[must_use]
    pub fn accepts(self, content_type: &str) -> bool {
        let normalized = content_type.trim().to_ascii_lowercase();
        self.allowed_content_types().contains(&normalized.as_str())
    }
}

impl fmt::Display for UploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile_photo" => Ok(Self::ProfilePhoto),
            "talent_certificate" => Ok(Self::TalentCertificate),
            other => Err(format!("unknown upload type: {other}")),
        }
    }
}

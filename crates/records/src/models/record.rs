use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::OffsetDateTime;

/// The published state of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRecord {
    pub key: u32,
    pub title: String,
    /// Public URL of the latest published artifact, if published yet.
    pub image_url: Option<String>,
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct RecordRow {
    key: i64,
    title: String,
    image_url: Option<String>,
    updated_at: i64,
}
impl TryFrom<RecordRow> for PublishRecord {
    type Error = Error;
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            key: u32::try_from(row.key).or_raise(|| ErrorKind::InvalidData("key"))?,
            title: row.title,
            image_url: row.image_url,
            updated_at: OffsetDateTime::from_unix_timestamp(row.updated_at)
                .or_raise(|| ErrorKind::InvalidData("update date"))?,
        })
    }
}

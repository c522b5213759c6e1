mod record;

pub use self::record::PublishRecord;
pub(crate) use self::record::RecordRow;

use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CheckInOut {
    pub(super) time: Option<DateTime<FixedOffset>>,
    pub(super) note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct StatusQuery {
    pub(super) date: Option<NaiveDate>,
}

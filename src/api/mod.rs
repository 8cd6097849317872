use chrono::{DateTime, FixedOffset, Local};
use serde::Deserialize;
use utoipa::IntoParams;

pub mod attendance;
pub mod manager;

/// Server wall clock. Both the record date and the lateness hour come from it.
pub(crate) fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// Calendar month 1-12, current month when omitted
    #[param(example = 10)]
    pub month: Option<u32>,
    /// Calendar year, current year when omitted
    #[param(example = 2026)]
    pub year: Option<i32>,
}

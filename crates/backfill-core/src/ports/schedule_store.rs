//! ScheduleStore port - cron スケジュール

use crate::domain::errors::StoreError;
use crate::domain::{DefinitionCode, Schedule};

pub trait ScheduleStore: Send + Sync {
    /// Schedules of `code` whose release state is ONLINE.
    fn get_active_schedules(&self, code: DefinitionCode) -> Result<Vec<Schedule>, StoreError>;
}

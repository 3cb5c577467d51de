//! Schedule trigger enumeration.
//!
//! Produces the ordered unit series a backfill window is split over:
//! - explicit date list → the list itself (sorted, de-duplicated)
//! - SERIAL range → the whole window as a single unit `[start, end]`
//! - PARALLEL range, no active schedule → every calendar day in `[start, end]`
//! - PARALLEL range, active schedules → merged cron fire instants inside the window

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use cron::Schedule as CronSchedule;
use tracing::debug;

use crate::config::BackfillConfig;
use crate::domain::{BackfillError, BackfillWindow, DefinitionCode, RunMode, Schedule};

/// Where the units of a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    /// SERIAL over a range: `units == [start, end]`, one command.
    WholeWindow,
    CalendarDays,
    CronFireTimes,
    DateList,
}

/// Ordered, de-duplicated units for one backfill target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSeries {
    pub source: SeriesSource,
    pub run_mode: RunMode,
    pub units: Vec<DateTime<Utc>>,
}

impl TriggerSeries {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Parallelism to partition with: SERIAL is always one chunk.
    pub fn parallelism(&self, expected: Option<i32>) -> i32 {
        match self.run_mode {
            RunMode::Serial => 1,
            RunMode::Parallel => expected
                .unwrap_or_else(|| i32::try_from(self.units.len()).unwrap_or(i32::MAX)),
        }
    }
}

/// Normalise a crontab to the 6/7-field form the `cron` crate expects.
///
/// 5-field expressions (`min hour dom month dow`) get a leading seconds field.
pub fn normalize_crontab(crontab: &str) -> Result<String, BackfillError> {
    let trimmed = crontab.trim();
    match trimmed.split_whitespace().count() {
        5 => Ok(format!("0 {trimmed}")),
        6 | 7 => Ok(trimmed.to_string()),
        n => Err(BackfillError::CronParse {
            crontab: crontab.to_string(),
            reason: format!("expected 5, 6 or 7 fields, found {n}"),
        }),
    }
}

fn parse_crontab(crontab: &str) -> Result<CronSchedule, BackfillError> {
    let normalized = normalize_crontab(crontab)?;
    CronSchedule::from_str(&normalized).map_err(|e| BackfillError::CronParse {
        crontab: crontab.to_string(),
        reason: e.to_string(),
    })
}

/// Every calendar day from `start` (same time of day) while `<= end`.
pub fn calendar_days(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        current += Duration::days(1);
    }
    days
}

pub struct TriggerEnumerator {
    max_units: usize,
    max_date_list: usize,
}

impl TriggerEnumerator {
    pub fn new(config: &BackfillConfig) -> Self {
        Self {
            max_units: config.max_fire_instants,
            max_date_list: config.max_schedule_date_list,
        }
    }

    /// Check the window alone, before anything is loaded for it.
    pub fn validate_window(&self, window: &BackfillWindow) -> Result<(), BackfillError> {
        match window {
            BackfillWindow::Range { start, end } => {
                if start >= end {
                    return Err(BackfillError::InvalidWindow {
                        start: start.to_rfc3339(),
                        end: end.to_rfc3339(),
                    });
                }
            }
            BackfillWindow::DateList(dates) => {
                if dates.is_empty() {
                    return Err(BackfillError::EmptyDateList);
                }
                let distinct = dates.iter().collect::<BTreeSet<_>>().len();
                if distinct > self.max_date_list {
                    return Err(BackfillError::DateListTooLong {
                        len: distinct,
                        limit: self.max_date_list,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn enumerate(
        &self,
        definition_code: DefinitionCode,
        window: &BackfillWindow,
        run_mode: RunMode,
        schedules: &[Schedule],
    ) -> Result<TriggerSeries, BackfillError> {
        self.validate_window(window)?;

        // Malformed crontabs are rejected whatever the mode.
        let active: Vec<(&Schedule, CronSchedule)> = schedules
            .iter()
            .filter(|s| s.is_active())
            .map(|s| parse_crontab(&s.crontab).map(|cron| (s, cron)))
            .collect::<Result<_, _>>()?;

        let (source, units) = match window {
            BackfillWindow::DateList(dates) => {
                let units: BTreeSet<DateTime<Utc>> = dates.iter().copied().collect();
                (SeriesSource::DateList, units.into_iter().collect())
            }
            BackfillWindow::Range { start, end } => match run_mode {
                RunMode::Serial => (SeriesSource::WholeWindow, vec![*start, *end]),
                RunMode::Parallel if active.is_empty() => {
                    let days = (*end - *start).num_days();
                    if usize::try_from(days).map_or(true, |d| d >= self.max_units) {
                        return Err(BackfillError::WindowTooLarge {
                            definition_code,
                            limit: self.max_units,
                        });
                    }
                    (SeriesSource::CalendarDays, calendar_days(*start, *end))
                }
                RunMode::Parallel => {
                    let units = self.fire_times(definition_code, &active, *start, *end)?;
                    (SeriesSource::CronFireTimes, units)
                }
            },
        };

        debug!(
            definition_code = %definition_code,
            source = ?source,
            units = units.len(),
            "enumerated backfill window"
        );
        Ok(TriggerSeries {
            source,
            run_mode,
            units,
        })
    }

    /// Merge fire instants of every schedule, clipped to the window and to the
    /// schedule's own validity range.
    fn fire_times(
        &self,
        definition_code: DefinitionCode,
        schedules: &[(&Schedule, CronSchedule)],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, BackfillError> {
        let mut merged = BTreeSet::new();
        for (schedule, cron) in schedules {
            let lower = start.max(schedule.start_time);
            let upper = end.min(schedule.end_time);
            if lower > upper {
                continue;
            }
            // `after` is exclusive; step back one second so `lower` itself can fire,
            // then drop anything before a sub-second `lower`.
            let fires = cron
                .after(&(lower - Duration::seconds(1)))
                .skip_while(|t| *t < lower)
                .take_while(|t| *t <= upper)
                .take(self.max_units + 1);
            merged.extend(fires);
            if merged.len() > self.max_units {
                return Err(BackfillError::WindowTooLarge {
                    definition_code,
                    limit: self.max_units,
                });
            }
        }
        Ok(merged.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseState;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn schedule(crontab: &str) -> Schedule {
        Schedule {
            definition_code: DefinitionCode(1),
            crontab: crontab.to_string(),
            start_time: at(2000, 1, 1, 0),
            end_time: at(2100, 1, 1, 0),
            release_state: ReleaseState::Online,
        }
    }

    fn enumerator() -> TriggerEnumerator {
        TriggerEnumerator::new(&BackfillConfig::default())
    }

    fn january() -> BackfillWindow {
        BackfillWindow::range(at(2020, 1, 1, 0), at(2020, 1, 31, 0))
    }

    #[rstest]
    #[case::five_fields("0 10 * * *", "0 0 10 * * *")]
    #[case::six_fields("0 0 10 * * *", "0 0 10 * * *")]
    #[case::seven_fields("0 0 10 * * * 2020", "0 0 10 * * * 2020")]
    #[case::padded("  0 0 10 * * *  ", "0 0 10 * * *")]
    fn crontab_normalisation(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_crontab(input).unwrap(), expected);
    }

    #[test]
    fn wrong_field_count_is_a_cron_error() {
        assert!(matches!(
            normalize_crontab("* *"),
            Err(BackfillError::CronParse { .. })
        ));
    }

    #[test]
    fn calendar_days_are_inclusive() {
        let days = calendar_days(at(2020, 1, 1, 0), at(2020, 1, 31, 0));
        assert_eq!(days.len(), 31);
        assert_eq!(days[0], at(2020, 1, 1, 0));
        assert_eq!(days[30], at(2020, 1, 31, 0));
    }

    #[test]
    fn parallel_without_schedule_uses_days() {
        let series = enumerator()
            .enumerate(DefinitionCode(1), &january(), RunMode::Parallel, &[])
            .unwrap();
        assert_eq!(series.source, SeriesSource::CalendarDays);
        assert_eq!(series.units.len(), 31);
    }

    #[test]
    fn serial_is_the_whole_window() {
        let series = enumerator()
            .enumerate(
                DefinitionCode(1),
                &january(),
                RunMode::Serial,
                &[schedule("0 0 * * * *")],
            )
            .unwrap();
        assert_eq!(series.source, SeriesSource::WholeWindow);
        assert_eq!(series.units, vec![at(2020, 1, 1, 0), at(2020, 1, 31, 0)]);
        assert_eq!(series.parallelism(Some(50)), 1);
    }

    #[test]
    fn cron_fire_times_inside_window() {
        let series = enumerator()
            .enumerate(
                DefinitionCode(1),
                &january(),
                RunMode::Parallel,
                &[schedule("0 0 10 * * *")],
            )
            .unwrap();
        assert_eq!(series.source, SeriesSource::CronFireTimes);
        // 10:00 on Jan 1..=Jan 30; Jan 31 10:00 is after the window end.
        assert_eq!(series.units.len(), 30);
        assert_eq!(series.units[0], at(2020, 1, 1, 10));
    }

    #[test]
    fn fire_at_window_start_is_included() {
        let series = enumerator()
            .enumerate(
                DefinitionCode(1),
                &january(),
                RunMode::Parallel,
                &[schedule("0 0 0 * * *")],
            )
            .unwrap();
        assert_eq!(series.units.len(), 31);
        assert_eq!(series.units[0], at(2020, 1, 1, 0));
    }

    #[test]
    fn sub_second_window_start_excludes_the_earlier_fire() {
        let start = at(2020, 1, 1, 0) + Duration::milliseconds(500);
        let series = enumerator()
            .enumerate(
                DefinitionCode(1),
                &BackfillWindow::range(start, at(2020, 1, 3, 0)),
                RunMode::Parallel,
                &[schedule("0 0 0 * * *")],
            )
            .unwrap();
        assert_eq!(series.units, vec![at(2020, 1, 2, 0), at(2020, 1, 3, 0)]);
        assert!(series.units.iter().all(|t| *t >= start));
    }

    // Assumption: overlapping schedules are merged then de-duplicated before partitioning.
    #[test]
    fn assumed_multi_schedule_merge_deduplicates() {
        let series = enumerator()
            .enumerate(
                DefinitionCode(1),
                &january(),
                RunMode::Parallel,
                &[schedule("0 0 10 * * *"), schedule("0 0 10 1-5 * *")],
            )
            .unwrap();
        assert_eq!(series.units.len(), 30);
        assert!(series.units.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn offline_schedules_are_ignored() {
        let mut offline = schedule("0 0 10 * * *");
        offline.release_state = ReleaseState::Offline;
        let series = enumerator()
            .enumerate(DefinitionCode(1), &january(), RunMode::Parallel, &[offline])
            .unwrap();
        assert_eq!(series.source, SeriesSource::CalendarDays);
    }

    #[test]
    fn schedule_validity_clips_fire_times() {
        let mut s = schedule("0 0 10 * * *");
        s.start_time = at(2020, 1, 11, 0);
        s.end_time = at(2020, 1, 20, 23);
        let series = enumerator()
            .enumerate(DefinitionCode(1), &january(), RunMode::Parallel, &[s])
            .unwrap();
        assert_eq!(series.units.len(), 10);
        assert_eq!(series.units[0], at(2020, 1, 11, 10));
    }

    #[test]
    fn malformed_crontab_is_rejected() {
        let err = enumerator()
            .enumerate(
                DefinitionCode(1),
                &january(),
                RunMode::Parallel,
                &[schedule("0 0 99 * * *")],
            )
            .unwrap_err();
        assert!(matches!(err, BackfillError::CronParse { .. }));
    }

    #[rstest]
    #[case::equal(at(2020, 1, 1, 0), at(2020, 1, 1, 0))]
    #[case::reversed(at(2020, 1, 2, 0), at(2020, 1, 1, 0))]
    fn start_not_before_end_is_rejected(#[case] start: DateTime<Utc>, #[case] end: DateTime<Utc>) {
        let err = enumerator()
            .enumerate(
                DefinitionCode(1),
                &BackfillWindow::range(start, end),
                RunMode::Serial,
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, BackfillError::InvalidWindow { .. }));
    }

    #[test]
    fn date_list_is_sorted_and_deduplicated() {
        let window = BackfillWindow::DateList(vec![
            at(2020, 1, 3, 0),
            at(2020, 1, 1, 0),
            at(2020, 1, 3, 0),
        ]);
        let series = enumerator()
            .enumerate(DefinitionCode(1), &window, RunMode::Parallel, &[])
            .unwrap();
        assert_eq!(series.source, SeriesSource::DateList);
        assert_eq!(series.units, vec![at(2020, 1, 1, 0), at(2020, 1, 3, 0)]);
    }

    #[test]
    fn date_list_limits() {
        let e = enumerator();
        assert!(matches!(
            e.validate_window(&BackfillWindow::DateList(vec![])),
            Err(BackfillError::EmptyDateList)
        ));
        let long: Vec<_> = (0..101).map(|i| at(2020, 1, 1, 0) + Duration::hours(i)).collect();
        assert!(matches!(
            e.validate_window(&BackfillWindow::DateList(long)),
            Err(BackfillError::DateListTooLong { len: 101, limit: 100 })
        ));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let config = BackfillConfig {
            max_fire_instants: 10,
            ..BackfillConfig::default()
        };
        let err = TriggerEnumerator::new(&config)
            .enumerate(DefinitionCode(1), &january(), RunMode::Parallel, &[])
            .unwrap_err();
        assert!(matches!(err, BackfillError::WindowTooLarge { limit: 10, .. }));
    }
}

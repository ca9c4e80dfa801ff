//! Publish-time scheduling for batch runs.
//!
//! Items are published in bursts of `batch_size`, `interval_hours` apart,
//! with an extra `break_hours` pause between the last post of one burst and
//! the first post of the next.

use chrono::{DateTime, Duration, Utc};

use guidepress_shared::{BatchItem, GuideError, Result, ScheduleConfig};

/// Publish time of the item at `index`, counting from `start`.
///
/// A `batch_size` of zero is treated as one. Settings that push the time
/// past what `chrono` can represent are a validation error.
pub fn publish_time(
    index: usize,
    start: DateTime<Utc>,
    config: &ScheduleConfig,
) -> Result<DateTime<Utc>> {
    let size = to_i64(config.batch_size.max(1), "batch_size")?;
    let index = to_i64(index, "item index")?;
    let interval = to_i64(config.interval_hours, "interval_hours")?;
    let pause = to_i64(config.break_hours, "break_hours")?;

    let burst = index / size;
    let position = index % size;

    let burst_hours = if burst == 0 {
        Some(0)
    } else {
        (size - 1)
            .checked_mul(interval)
            .and_then(|h| h.checked_add(pause))
            .and_then(|span| span.checked_mul(burst))
    };
    let offset_hours = burst_hours
        .zip(position.checked_mul(interval))
        .and_then(|(b, p)| b.checked_add(p))
        .ok_or_else(|| overflow(index))?;

    let offset = Duration::try_hours(offset_hours).ok_or_else(|| overflow(index))?;
    start.checked_add_signed(offset).ok_or_else(|| overflow(index))
}

/// Default start: `lead_hours` from `now`.
pub fn default_start(now: DateTime<Utc>, config: &ScheduleConfig) -> Result<DateTime<Utc>> {
    let lead = to_i64(config.lead_hours, "lead_hours")?;
    Duration::try_hours(lead)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| GuideError::validation(format!("lead_hours {lead} is out of range")))
}

/// Stamp every item with its publish time.
pub fn assign(items: &mut [BatchItem], start: DateTime<Utc>, config: &ScheduleConfig) -> Result<()> {
    for (i, item) in items.iter_mut().enumerate() {
        item.scheduled_at = Some(publish_time(i, start, config)?);
    }
    Ok(())
}

fn to_i64<T: TryInto<i64>>(value: T, what: &str) -> Result<i64> {
    value
        .try_into()
        .map_err(|_| GuideError::validation(format!("{what} is too large")))
}

fn overflow(index: i64) -> GuideError {
    GuideError::validation(format!("publish time of item {index} is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(batch_size: usize) -> ScheduleConfig {
        ScheduleConfig {
            batch_size,
            interval_hours: 1,
            break_hours: 24,
            lead_hours: 1,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn bursts_of_two() {
        let cfg = config(2);
        let times: Vec<_> = (0..4).map(|i| publish_time(i, t0(), &cfg).unwrap()).collect();
        assert_eq!(
            times,
            vec![
                t0(),
                t0() + Duration::hours(1),
                t0() + Duration::hours(25),
                t0() + Duration::hours(26),
            ]
        );
    }

    #[test]
    fn default_ten_per_burst() {
        let cfg = config(10);
        assert_eq!(publish_time(9, t0(), &cfg).unwrap(), t0() + Duration::hours(9));
        assert_eq!(publish_time(10, t0(), &cfg).unwrap(), t0() + Duration::hours(33));
    }

    #[test]
    fn zero_batch_size_is_one() {
        let cfg = config(0);
        assert_eq!(publish_time(1, t0(), &cfg).unwrap(), t0() + Duration::hours(24));
    }

    #[test]
    fn assigns_in_order() {
        let mut items = vec![BatchItem::new("A", "일반"), BatchItem::new("B", "일반")];
        assign(&mut items, t0(), &config(1)).unwrap();
        assert_eq!(items[0].scheduled_at, Some(t0()));
        assert_eq!(items[1].scheduled_at, Some(t0() + Duration::hours(24)));
        assert_eq!(default_start(t0(), &config(1)).unwrap(), t0() + Duration::hours(1));
    }

    #[test]
    fn huge_settings_are_rejected_not_wrapped() {
        let huge_interval = ScheduleConfig {
            interval_hours: u64::MAX,
            ..config(2)
        };
        assert!(matches!(
            publish_time(1, t0(), &huge_interval),
            Err(GuideError::Validation { .. })
        ));

        let huge_batch = ScheduleConfig {
            batch_size: i64::MAX as usize,
            ..config(2)
        };
        assert_eq!(publish_time(3, t0(), &huge_batch).unwrap(), t0() + Duration::hours(3));

        let huge_break = ScheduleConfig {
            break_hours: i64::MAX as u64,
            ..config(1)
        };
        assert!(publish_time(1, t0(), &huge_break).is_err());

        let mut items = vec![BatchItem::new("A", "일반"), BatchItem::new("B", "일반")];
        assert!(assign(&mut items, t0(), &huge_break).is_err());

        let huge_lead = ScheduleConfig {
            lead_hours: u64::MAX,
            ..config(1)
        };
        assert!(default_start(t0(), &huge_lead).is_err());
    }
}

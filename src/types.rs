use std::fmt;

use chrono::{DateTime, Duration, Utc};

const CONTINUOUS_MINUTES: i64 = 10;
const MONTH_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Destination becomes an exact copy; extraneous entries are deleted.
    #[default]
    Mirror,
    /// Only adds and updates; never deletes from the destination.
    AdditiveCopy,
}

impl SyncMode {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mirror" => Ok(SyncMode::Mirror),
            "copy" | "additive" | "additive-copy" => Ok(SyncMode::AdditiveCopy),
            _ => Err(format!(
                "invalid sync mode {}; expected mirror or copy",
                value
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Mirror => "mirror",
            SyncMode::AdditiveCopy => "copy",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    /// Manual-only; the timer is disarmed.
    #[default]
    None,
    EveryN(Duration),
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn parse(value: &str) -> Result<Self, String> {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "none" | "off" | "manual" => Ok(Interval::None),
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            "continuous" | "continuous (10 minutes)" => {
                Ok(Interval::EveryN(Duration::minutes(CONTINUOUS_MINUTES)))
            }
            other => {
                let period = other
                    .strip_prefix("every:")
                    .or_else(|| other.strip_prefix("every "))
                    .unwrap_or(other)
                    .trim();
                parse_period(period).map(Interval::EveryN).ok_or_else(|| {
                    format!(
                        "invalid interval {}; expected none, daily, weekly, monthly, continuous, or every:<n><s|m|h|d>",
                        value
                    )
                })
            }
        }
    }

    pub fn period(&self) -> Option<Duration> {
        match self {
            Interval::None => None,
            Interval::EveryN(period) => Some(*period),
            Interval::Daily => Some(Duration::days(1)),
            Interval::Weekly => Some(Duration::days(7)),
            Interval::Monthly => Some(Duration::days(MONTH_DAYS)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Interval::None)
    }

    /// Due time one period after `from`, or `None` when manual-only.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.period().and_then(|period| from.checked_add_signed(period))
    }

    pub fn to_setting(&self) -> String {
        match self {
            Interval::None => "none".to_string(),
            Interval::EveryN(period) => format!("every:{}", format_period(*period)),
            Interval::Daily => "daily".to_string(),
            Interval::Weekly => "weekly".to_string(),
            Interval::Monthly => "monthly".to_string(),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_setting())
    }
}

fn parse_period(text: &str) -> Option<Duration> {
    let unit = text.chars().last()?;
    let digits = &text[..text.len() - unit.len_utf8()];
    let count: i64 = digits.trim().parse().ok()?;
    if count <= 0 {
        return None;
    }
    let scale = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        _ => return None,
    };
    Duration::try_seconds(count.checked_mul(scale)?)
}

fn format_period(period: Duration) -> String {
    let secs = period.num_seconds();
    if secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Waiting,
    Running,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Waiting => "waiting",
            Phase::Running => "running",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Scheduled,
}

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Date pattern embedded in index names, i.e `logs-2023-01-10`
pub const DEFAULT_TIMESTRING: &str = "%Y-%m-%d";

/// How many units an index must be older than to be selected
pub const DEFAULT_UNIT_COUNT: u32 = 4;

/// Which side of the point of reference an index must fall on to be kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Older,
    Younger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl Unit {
    /// Length of one unit in seconds. Months are 30 days and years are 365.
    pub fn seconds(self) -> i64 {
        match self {
            Unit::Seconds => 1,
            Unit::Minutes => 60,
            Unit::Hours => 3_600,
            Unit::Days => 86_400,
            Unit::Weeks => 604_800,
            Unit::Months => 2_592_000,
            Unit::Years => 31_536_000,
        }
    }
}

/// Select indices by the date embedded in their name.
///
/// The point of reference is `now - unit_count * unit`. With
/// [`Direction::Older`] an index is selected when its name date is strictly
/// before that point, with [`Direction::Younger`] when strictly after.
/// Indices without a parseable date in their name are never selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeFilter {
    pub direction: Direction,
    pub timestring: String,
    pub unit: Unit,
    pub unit_count: u32,
}

impl Default for AgeFilter {
    fn default() -> Self {
        AgeFilter {
            direction: Direction::Older,
            timestring: DEFAULT_TIMESTRING.to_string(),
            unit: Unit::Days,
            unit_count: DEFAULT_UNIT_COUNT,
        }
    }
}

impl AgeFilter {
    /// `now` minus `unit_count` units. Fails when the span or the result
    /// falls outside the range chrono can represent.
    pub fn point_of_reference(
        &self, now: DateTime<Utc>,
    ) -> anyhow::Result<DateTime<Utc>> {
        self.unit
            .seconds()
            .checked_mul(i64::from(self.unit_count))
            .and_then(Duration::try_seconds)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} {:?} before {} is out of range",
                    self.unit_count,
                    self.unit,
                    now
                )
            })
    }

    /// Return the indices that pass the filter, in their original order.
    pub fn apply(
        &self, indices: &[String], now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<String>> {
        let search = TimestringSearch::new(&self.timestring)?;
        let reference = self.point_of_reference(now)?;
        log::debug!(
            "point of reference: {}, direction: {:?}",
            reference,
            self.direction
        );

        let selected = indices
            .iter()
            .filter(|index| match search.timestamp(index) {
                Some(age) => {
                    let keep = match self.direction {
                        Direction::Older => age < reference,
                        Direction::Younger => age > reference,
                    };
                    log::debug!(
                        "index {} age {}, selected: {}",
                        index,
                        age,
                        keep
                    );
                    keep
                }
                None => {
                    log::debug!(
                        "index {} has no {} date in its name, skipped",
                        index,
                        self.timestring
                    );
                    false
                }
            })
            .cloned()
            .collect::<Vec<_>>();
        Ok(selected)
    }
}

/// Find and parse a strftime-style timestamp inside an index name
#[derive(Debug)]
pub struct TimestringSearch {
    timestring: String,
    pattern: Regex,
}

impl TimestringSearch {
    pub fn new(timestring: &str) -> anyhow::Result<Self> {
        let pattern = Regex::new(&date_regex(timestring))?;
        Ok(TimestringSearch { timestring: timestring.to_string(), pattern })
    }

    /// Timestamp of the first match in `name`, read as UTC. A match that is
    /// not a real date (i.e `2023-02-30`) yields `None`.
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        let found = self.pattern.find(name)?;
        let naive = parse_naive(found.as_str(), &self.timestring)?;
        Some(Utc.from_utc_datetime(&naive))
    }
}

fn parse_naive(s: &str, timestring: &str) -> Option<NaiveDateTime> {
    let (s, timestring) = complete_date(s, timestring);
    if let Ok(t) = NaiveDateTime::parse_from_str(&s, &timestring) {
        return Some(t);
    }
    NaiveDate::parse_from_str(&s, &timestring).ok()?.and_hms_opt(0, 0, 0)
}

/// Pin patterns that name a week or a month to one day: Monday of the week
/// (`%w` = 1), or the first of the month. `%G-%V` resolves as an ISO week.
fn complete_date(s: &str, timestring: &str) -> (String, String) {
    let has = |token: &str| timestring.contains(token);
    if has("%W") || has("%U") || has("%V") {
        (format!("{}1", s), format!("{}%w", timestring))
    } else if has("%m") && !has("%d") {
        (format!("{}1", s), format!("{}%d", timestring))
    } else {
        (s.to_string(), timestring.to_string())
    }
}

/// Translate a strftime pattern into a regex matching the text it produces
fn date_regex(timestring: &str) -> String {
    let mut out = String::new();
    let mut chars = timestring.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push_str(&regex::escape(&c.to_string()));
            continue;
        }
        match chars.next() {
            Some('Y') | Some('G') => out.push_str(r"\d{4}"),
            Some('y') | Some('m') | Some('d') | Some('H') | Some('M')
            | Some('S') | Some('W') | Some('U') | Some('V') => {
                out.push_str(r"\d{2}")
            }
            Some('j') => out.push_str(r"\d{3}"),
            Some(other) => {
                out.push_str(&regex::escape(&format!("%{}", other)))
            }
            None => out.push_str(&regex::escape("%")),
        }
    }
    out
}

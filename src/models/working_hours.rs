use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const DAY_ORDER: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeWindow {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Weekly opening windows of a professional (or of the salon).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkingHours {
    #[serde(default, alias = "slots")]
    pub windows: Vec<TimeWindow>,
}

impl WorkingHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: WorkingHours = serde_json::from_str(s)?;
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for window in &self.windows {
            parse_weekday(&window.day)?;
            let start = parse_time(&window.start)?;
            let end = parse_time(&window.end)?;
            if end <= start {
                anyhow::bail!("window ends before it starts: {}-{}", window.start, window.end);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Open intervals on a given date, sorted. Invalid windows are skipped.
    pub fn windows_on(&self, date: NaiveDate) -> Vec<(NaiveTime, NaiveTime)> {
        let weekday = weekday_key(date);
        let mut windows: Vec<_> = self
            .windows
            .iter()
            .filter(|w| w.day.to_lowercase() == weekday)
            .filter_map(|w| Some((parse_time(&w.start).ok()?, parse_time(&w.end).ok()?)))
            .collect();
        windows.sort();
        windows
    }

    pub fn is_available(&self, dt: &NaiveDateTime) -> bool {
        let time = dt.time();
        self.windows_on(dt.date())
            .iter()
            .any(|(start, end)| time >= *start && time < *end)
    }

    /// Whether `[dt, dt + duration)` sits entirely inside one window.
    pub fn fits(&self, dt: &NaiveDateTime, duration_minutes: i32) -> bool {
        let end_dt = *dt + Duration::minutes(duration_minutes as i64);
        // Windows never cross midnight.
        if end_dt.date() != dt.date() {
            return false;
        }
        let start = dt.time();
        let end = end_dt.time();
        self.windows_on(dt.date())
            .iter()
            .any(|(ws, we)| start >= *ws && end <= *we)
    }

    pub fn to_human_readable(&self) -> String {
        if self.windows.is_empty() {
            return String::new();
        }

        let mut sorted = self.windows.clone();
        sorted.sort_by_key(|w| {
            let idx = DAY_ORDER
                .iter()
                .position(|d| *d == w.day.to_lowercase())
                .unwrap_or(7);
            (idx, w.start.clone())
        });

        sorted
            .iter()
            .map(|w| format!("{}: {}-{}", capitalize(&w.day), w.start, w.end))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn weekday_key(date: NaiveDate) -> &'static str {
    DAY_ORDER[date.weekday().num_days_from_monday() as usize]
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + &c.as_str().to_lowercase(),
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    if DAY_ORDER.contains(&s.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("invalid weekday: {s}"))
    }
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| anyhow::anyhow!("invalid time format: {s}"))
}

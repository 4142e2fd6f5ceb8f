//! Admin daily schedule: a grid of time rows by professional columns.
//!
//! Cells are computed from grouped appointments and blocked slots. Rows are
//! half-open `[t, t + slot)` and a cell is occupied when anything overlaps it.

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::models::{Appointment, AppointmentGroup, BlockedSlot, Professional};
use crate::services::grouping::group_appointments;
use crate::services::scheduling::{occupied_intervals, Interval};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_minutes: u32,
}

impl GridConfig {
    pub fn rows(&self) -> Vec<NaiveTime> {
        let mut rows = Vec::new();
        if self.slot_minutes == 0 {
            return rows;
        }
        let step = Duration::minutes(self.slot_minutes as i64);
        let mut t = self.open;
        while t < self.close {
            rows.push(t);
            let (next, wrapped) = t.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            t = next;
        }
        rows
    }

    pub fn open_minutes(&self) -> i64 {
        (self.close - self.open).num_minutes().max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Free,
    /// First row of a group's card; the index points into `groups`.
    Start { group: usize },
    Continues { group: usize },
    Blocked { reason: Option<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleColumn {
    pub professional_id: String,
    pub professional_name: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub professional_id: String,
    pub first: Interval,
    pub second: Interval,
}

#[derive(Debug, Clone)]
pub struct DailySchedule {
    pub date: NaiveDate,
    pub grid: GridConfig,
    pub rows: Vec<NaiveTime>,
    pub columns: Vec<ScheduleColumn>,
    pub groups: Vec<AppointmentGroup>,
    appointments: Vec<Appointment>,
    blocked: Vec<BlockedSlot>,
}

impl DailySchedule {
    pub fn build(
        date: NaiveDate,
        professionals: &[Professional],
        appointments: &[Appointment],
        blocked: &[BlockedSlot],
        grid: GridConfig,
    ) -> Self {
        let appointments: Vec<Appointment> = appointments
            .iter()
            .filter(|a| a.start_time.date() == date && a.is_occupying())
            .cloned()
            .collect();
        let blocked: Vec<BlockedSlot> = blocked
            .iter()
            .filter(|b| b.start_time.date() <= date && b.end_time.date() >= date)
            .cloned()
            .collect();
        let groups = group_appointments(&appointments);
        let rows = grid.rows();

        let mut column_ids: Vec<(String, String)> = professionals
            .iter()
            .filter(|p| p.active)
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect();
        // Keep bookings visible even if their professional is inactive or unknown
        for appt in &appointments {
            if !column_ids.iter().any(|(id, _)| *id == appt.professional_id) {
                let name = professionals
                    .iter()
                    .find(|p| p.id == appt.professional_id)
                    .map(|p| p.name.clone())
                    .or_else(|| appt.professional_name.clone())
                    .unwrap_or_else(|| appt.professional_id.clone());
                column_ids.push((appt.professional_id.clone(), name));
            }
        }

        let columns = column_ids
            .into_iter()
            .map(|(id, name)| {
                let cells = build_cells(date, &rows, &grid, &id, &groups, &blocked);
                ScheduleColumn {
                    professional_id: id,
                    professional_name: name,
                    cells,
                }
            })
            .collect();

        Self {
            date,
            grid,
            rows,
            columns,
            groups,
            appointments,
            blocked,
        }
    }

    /// Every pair of occupied intervals that overlap in one column.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for column in &self.columns {
            let intervals = occupied_intervals(
                &column.professional_id,
                &self.appointments,
                &self.blocked,
                &[],
            );
            for (i, first) in intervals.iter().enumerate() {
                for second in intervals.iter().skip(i + 1) {
                    if first.overlaps(second.start, second.end) {
                        conflicts.push(Conflict {
                            professional_id: column.professional_id.clone(),
                            first: first.clone(),
                            second: second.clone(),
                        });
                    }
                }
            }
        }
        conflicts
    }

    /// Share of opening hours that each professional is busy, in `0.0..=1.0`.
    pub fn occupancy(&self) -> Vec<(String, f64)> {
        let open = self.date.and_time(self.grid.open);
        let close = self.date.and_time(self.grid.close);
        let total = self.grid.open_minutes();

        self.columns
            .iter()
            .map(|column| {
                let intervals = occupied_intervals(
                    &column.professional_id,
                    &self.appointments,
                    &self.blocked,
                    &[],
                );
                let busy = merged_minutes(&intervals, open, close);
                let ratio = if total == 0 {
                    0.0
                } else {
                    busy as f64 / total as f64
                };
                (column.professional_id.clone(), ratio)
            })
            .collect()
    }

    pub fn free_cells(&self, professional_id: &str) -> Vec<NaiveTime> {
        self.columns
            .iter()
            .find(|c| c.professional_id == professional_id)
            .map(|c| {
                c.cells
                    .iter()
                    .zip(&self.rows)
                    .filter(|(cell, _)| **cell == Cell::Free)
                    .map(|(_, t)| *t)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fixed-width grid for terminals.
    pub fn render_grid(&self) -> String {
        const WIDTH: usize = 18;
        let mut out = String::new();
        let _ = write!(out, "{:<6}", "");
        for column in &self.columns {
            let _ = write!(out, "| {:<w$}", truncate(&column.professional_name, WIDTH - 2), w = WIDTH - 1);
        }
        out.push('\n');

        for (row_idx, time) in self.rows.iter().enumerate() {
            let _ = write!(out, "{:<6}", time.format("%H:%M"));
            for column in &self.columns {
                let text = match &column.cells[row_idx] {
                    Cell::Free => String::new(),
                    Cell::Start { group } => {
                        let g = &self.groups[*group];
                        format!("{} ({}m)", g.client_name, g.duration_for(&column.professional_id))
                    }
                    Cell::Continues { .. } => "  ⋮".to_string(),
                    Cell::Blocked { reason } => {
                        format!("▒ {}", reason.as_deref().unwrap_or("Bloqueado"))
                    }
                };
                let _ = write!(out, "| {:<w$}", truncate(&text, WIDTH - 2), w = WIDTH - 1);
            }
            out.push('\n');
        }
        out
    }

    /// One line per group, in start order.
    pub fn render_list(&self) -> String {
        let mut out = String::new();
        for group in &self.groups {
            let _ = writeln!(
                out,
                "{}-{}  {:<20} {:<24} {:>8.2}  {}",
                group.start_time.format("%H:%M"),
                group.end_time().format("%H:%M"),
                truncate(&group.client_name, 20),
                truncate(&group.service_names().join(" + "), 24),
                group.price,
                group.status().label(),
            );
        }
        for slot in &self.blocked {
            let _ = writeln!(
                out,
                "{}-{}  [bloqueio] {} {}",
                slot.start_time.format("%H:%M"),
                slot.end_time.format("%H:%M"),
                slot.professional_id,
                slot.reason.as_deref().unwrap_or(""),
            );
        }
        out
    }
}

fn build_cells(
    date: NaiveDate,
    rows: &[NaiveTime],
    grid: &GridConfig,
    professional_id: &str,
    groups: &[AppointmentGroup],
    blocked: &[BlockedSlot],
) -> Vec<Cell> {
    let step = Duration::minutes(grid.slot_minutes as i64);

    // Per-group interval on this professional only
    let spans: Vec<(usize, NaiveDateTime, NaiveDateTime)> = groups
        .iter()
        .enumerate()
        .filter_map(|(idx, g)| {
            let minutes = g.duration_for(professional_id);
            (minutes > 0).then(|| {
                (idx, g.start_time, g.start_time + Duration::minutes(minutes as i64))
            })
        })
        .collect();

    let mut labelled: Vec<usize> = Vec::new();
    rows.iter()
        .map(|time| {
            let row_start = date.and_time(*time);
            let row_end = row_start + step;

            let overlapping: Vec<usize> = spans
                .iter()
                .filter(|(_, s, e)| *s < row_end && row_start < *e)
                .map(|(idx, _, _)| *idx)
                .collect();

            // Every card gets its label on the first row it reaches, even
            // when an earlier card still holds the top of that row
            if let Some(idx) = overlapping.iter().find(|idx| !labelled.contains(idx)) {
                labelled.push(*idx);
                return Cell::Start { group: *idx };
            }
            if let Some(idx) = overlapping.first() {
                return Cell::Continues { group: *idx };
            }

            if let Some(slot) = blocked.iter().find(|b| {
                b.professional_id == professional_id && b.start_time < row_end && row_start < b.end_time
            }) {
                return Cell::Blocked {
                    reason: slot.reason.clone(),
                };
            }

            Cell::Free
        })
        .collect()
}

fn merged_minutes(intervals: &[Interval], open: NaiveDateTime, close: NaiveDateTime) -> i64 {
    let mut clipped: Vec<(NaiveDateTime, NaiveDateTime)> = intervals
        .iter()
        .map(|i| (i.start.max(open), i.end.min(close)))
        .filter(|(s, e)| s < e)
        .collect();
    clipped.sort();

    let mut total = 0;
    let mut current: Option<(NaiveDateTime, NaiveDateTime)> = None;
    for (s, e) in clipped {
        current = match current {
            Some((cs, ce)) if s <= ce => Some((cs, ce.max(e))),
            Some((cs, ce)) => {
                total += (ce - cs).num_minutes();
                Some((s, e))
            }
            None => Some((s, e)),
        };
    }
    if let Some((cs, ce)) = current {
        total += (ce - cs).num_minutes();
    }
    total
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

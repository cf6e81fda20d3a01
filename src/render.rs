use crate::data::{BREAK_SLOT, Day, LUNCH_SLOT, PERIODS_PER_DAY, SectionTimetable, SlotIndex};
use itertools::Itertools;
use std::fmt;

pub const PERIOD_TIMES: [&str; PERIODS_PER_DAY] = [
    "8:00-8:55",
    "9:00-9:55",
    "10:00-10:45",
    "11:15-12:10",
    "12:10-1:05",
    "2:00-2:55",
    "3:00-3:55",
];

const DAY_WIDTH: usize = 12;
const CELL_WIDTH: usize = 15;

/// Header label and time window shown in place of a reserved slot.
pub fn break_label(slot: SlotIndex) -> Option<(&'static str, &'static str)> {
    match slot {
        BREAK_SLOT => Some(("Break", "10:45-11:15")),
        LUNCH_SLOT => Some(("Lunch", "1:05-2:00")),
        _ => None,
    }
}

/// Text view of one section: the grid, the teacher legend and any unplaced units.
pub struct TimetableView<'a> {
    pub section_name: &'a str,
    pub timetable: &'a SectionTimetable,
}

impl fmt::Display for TimetableView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timetable = self.timetable;
        writeln!(f, "\nTimetable for {}:\n", self.section_name)?;

        write!(f, "{:<DAY_WIDTH$}", "Time")?;
        for slot in 0..PERIODS_PER_DAY {
            let header = break_label(slot).map_or(PERIOD_TIMES[slot], |(name, _)| name);
            write!(f, "{:<CELL_WIDTH$}", header)?;
        }
        writeln!(f)?;

        for day in Day::ALL {
            write!(f, "{:<DAY_WIDTH$}", day)?;
            let labels = timetable.grid.labels(day, &timetable.catalog);
            for (slot, label) in labels.iter().enumerate() {
                let text = match break_label(slot) {
                    Some((_, window)) => window,
                    None => label.as_deref().unwrap_or(""),
                };
                write!(f, "{:<CELL_WIDTH$}", text)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\nTeachers:")?;
        for subject in timetable.catalog.subjects() {
            writeln!(f, "{}: {}", subject.name, subject.teacher)?;
        }

        if !timetable.is_complete() {
            let unplaced = timetable
                .unplaced
                .iter()
                .filter_map(|u| timetable.catalog.get(u.subject).map(|s| s.label(u.kind)))
                .counts()
                .into_iter()
                .sorted()
                .map(|(label, n)| format!("{} x{}", label, n))
                .join(", ");
            writeln!(f, "\nUnplaced: {}", unplaced)?;
        }
        Ok(())
    }
}

pub fn render_timetable(section_name: &str, timetable: &SectionTimetable) -> String {
    TimetableView {
        section_name,
        timetable,
    }
    .to_string()
}

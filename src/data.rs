use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub type SlotIndex = usize;
/// Position of a subject inside its section's catalog.
pub type SubjectId = usize;

pub const PERIODS_PER_DAY: usize = 7;
pub const BREAK_SLOT: SlotIndex = 2;
pub const LUNCH_SLOT: SlotIndex = 5;
pub const MAX_WEEKLY_HOURS: u64 = 35;
/// Teaching cells in one week; no subject count may exceed it.
pub const TEACHING_CELLS: u32 = 25;
pub const LAB_SUFFIX: &str = " (Lab)";

pub fn is_break_slot(slot: SlotIndex) -> bool {
    slot == BREAK_SLOT || slot == LUNCH_SLOT
}

/// Every slot a subject may be placed in, in ascending order.
pub fn teaching_slots() -> impl Iterator<Item = SlotIndex> {
    (0..PERIODS_PER_DAY).filter(|s| !is_break_slot(*s))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// First slot of every adjacent pair a lab may occupy.
pub fn lab_start_slots() -> impl Iterator<Item = SlotIndex> {
    (0..PERIODS_PER_DAY - 1).filter(|s| !is_break_slot(*s) && !is_break_slot(s + 1))
}

/// A subject taught to a section, with its weekly load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub teacher: String,
    pub weekly_classes: u32,
    pub weekly_labs: u32,
}

impl Subject {
    pub fn new(name: &str, teacher: &str, weekly_classes: u32, weekly_labs: u32) -> Self {
        Subject {
            name: name.to_string(),
            teacher: teacher.to_string(),
            weekly_classes,
            weekly_labs,
        }
    }

    pub fn label(&self, kind: UnitKind) -> String {
        match kind {
            UnitKind::Class => self.name.clone(),
            UnitKind::Lab => format!("{}{}", self.name, LAB_SUFFIX),
        }
    }

    /// Labs count double since each one takes two periods.
    pub fn weekly_hours(&self) -> u64 {
        u64::from(self.weekly_classes) + 2 * u64::from(self.weekly_labs)
    }
}

/// Ordered subject list of one section. Read-only once scheduling starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    subjects: Vec<Subject>,
}

impl Catalog {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Catalog { subjects }
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn get(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn teacher_of(&self, id: SubjectId) -> Option<&str> {
        self.get(id).map(|s| s.teacher.as_str())
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn teachers(&self) -> Vec<String> {
        self.subjects.iter().map(|s| s.teacher.clone()).collect()
    }

    pub fn total_hours(&self) -> u64 {
        self.subjects
            .iter()
            .map(Subject::weekly_hours)
            .fold(0, u64::saturating_add)
    }

    /// Advisory only: the scheduler runs the full catalog regardless.
    pub fn workload_warning(&self) -> Option<WorkloadWarning> {
        let total_hours = self.total_hours();
        (total_hours > MAX_WEEKLY_HOURS).then_some(WorkloadWarning {
            total_hours,
            limit: MAX_WEEKLY_HOURS,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (i, subject) in self.subjects.iter().enumerate() {
            if subject.name.trim().is_empty() {
                return Err(format!("Subject {} has an empty name.", i + 1));
            }
            if subject.teacher.trim().is_empty() {
                return Err(format!("Subject '{}' has no teacher.", subject.name));
            }
            if subject.weekly_classes > TEACHING_CELLS || subject.weekly_labs > TEACHING_CELLS {
                return Err(format!(
                    "Subject '{}' asks for more than {} classes or labs a week.",
                    subject.name, TEACHING_CELLS
                ));
            }
            if !seen.insert(subject.name.as_str()) {
                return Err(format!(
                    "Subject '{}' appears more than once in the catalog.",
                    subject.name
                ));
            }
        }
        Ok(())
    }

    /// Expands the catalog into class units followed by lab units, in catalog order.
    pub fn units(&self) -> (Vec<Unit>, Vec<Unit>) {
        let mut classes = Vec::new();
        let mut labs = Vec::new();
        for (subject, s) in self.subjects.iter().enumerate() {
            classes.extend((0..s.weekly_classes).map(|_| Unit::new(subject, UnitKind::Class)));
            labs.extend((0..s.weekly_labs).map(|_| Unit::new(subject, UnitKind::Lab)));
        }
        (classes, labs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadWarning {
    pub total_hours: u64,
    pub limit: u64,
}

impl fmt::Display for WorkloadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total weekly hours {} exceed {} hours/week.",
            self.total_hours, self.limit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    Class,
    Lab,
}

/// One weekly occurrence to place: a single period for a class, two adjacent for a lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    pub subject: SubjectId,
    pub kind: UnitKind,
}

impl Unit {
    pub fn new(subject: SubjectId, kind: UnitKind) -> Self {
        Unit { subject, kind }
    }
}

/// Contents of an occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub subject: SubjectId,
    pub kind: UnitKind,
}

impl Placement {
    pub fn label(&self, catalog: &Catalog) -> String {
        catalog
            .get(self.subject)
            .map(|s| s.label(self.kind))
            .unwrap_or_default()
    }
}

impl From<Unit> for Placement {
    fn from(unit: Unit) -> Self {
        Placement {
            subject: unit.subject,
            kind: unit.kind,
        }
    }
}

pub type Cell = Option<Placement>;

/// Weekly slot matrix of one section: 5 days of 7 cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: [[Cell; PERIODS_PER_DAY]; 5],
}

impl Grid {
    pub fn new() -> Self {
        Grid::default()
    }

    pub fn get(&self, day: Day, slot: SlotIndex) -> Cell {
        self.rows[day.index()][slot]
    }

    pub fn row(&self, day: Day) -> &[Cell; PERIODS_PER_DAY] {
        &self.rows[day.index()]
    }

    pub fn is_free(&self, day: Day, slot: SlotIndex) -> bool {
        self.get(day, slot).is_none()
    }

    /// Break slots are rejected here so that no grid can ever hold them.
    pub(crate) fn place(&mut self, day: Day, slot: SlotIndex, placement: Placement) -> bool {
        if is_break_slot(slot) || slot >= PERIODS_PER_DAY || !self.is_free(day, slot) {
            return false;
        }
        self.rows[day.index()][slot] = Some(placement);
        true
    }

    /// True if the subject already has any occurrence, class or lab, that day.
    pub fn has_subject_on(&self, day: Day, subject: SubjectId) -> bool {
        self.row(day).iter().flatten().any(|p| p.subject == subject)
    }

    /// True if the exact placement (subject and kind) already sits on that day.
    pub fn has_placement_on(&self, day: Day, placement: Placement) -> bool {
        self.row(day).iter().flatten().any(|p| *p == placement)
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Day, SlotIndex, Placement)> + '_ {
        Day::ALL.into_iter().flat_map(move |day| {
            self.row(day)
                .iter()
                .enumerate()
                .filter_map(move |(slot, cell)| cell.map(|p| (day, slot, p)))
        })
    }

    pub fn labels(&self, day: Day, catalog: &Catalog) -> Vec<Option<String>> {
        self.row(day)
            .iter()
            .map(|cell| cell.map(|p| p.label(catalog)))
            .collect()
    }
}

/// Outcome of one section's run. Units that found no slot are kept, not dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTimetable {
    pub catalog: Catalog,
    pub grid: Grid,
    pub unplaced: Vec<Unit>,
}

impl SectionTimetable {
    pub fn teacher_at(&self, day: Day, slot: SlotIndex) -> Option<&str> {
        self.grid
            .get(day, slot)
            .and_then(|p| self.catalog.teacher_of(p.subject))
    }

    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }
}

/// Request body for generating both sections. A missing `sectionB` reuses `sectionA`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    pub section_a: Catalog,
    #[serde(default)]
    pub section_b: Option<Catalog>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRow {
    pub day: Day,
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedUnit {
    pub subject: String,
    pub kind: UnitKind,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionReport {
    pub name: String,
    pub total_hours: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_warning: Option<WorkloadWarning>,
    pub days: Vec<DayRow>,
    pub unplaced: Vec<UnplacedUnit>,
}

impl SectionReport {
    pub fn new(name: &str, timetable: &SectionTimetable) -> Self {
        let catalog = &timetable.catalog;
        SectionReport {
            name: name.to_string(),
            total_hours: catalog.total_hours(),
            workload_warning: catalog.workload_warning(),
            days: Day::ALL
                .into_iter()
                .map(|day| DayRow {
                    day,
                    cells: timetable.grid.labels(day, catalog),
                })
                .collect(),
            unplaced: timetable
                .unplaced
                .iter()
                .filter_map(|u| {
                    catalog.get(u.subject).map(|s| UnplacedUnit {
                        subject: s.name.clone(),
                        kind: u.kind,
                        label: s.label(u.kind),
                    })
                })
                .collect(),
        }
    }
}

/// The final output of a two-section run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableResponse {
    pub seed: u64,
    pub sections: Vec<SectionReport>,
}

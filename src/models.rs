use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseLabelError;
use crate::stats::Category;

/// Attendance mark recorded for one student on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Sick,
    Excused,
    Absent,
    Late,
}

impl AttendanceStatus {
    /// Marks that count against attendance. `Late` is neither present nor absent.
    pub fn is_absence(self) -> bool {
        matches!(
            self,
            AttendanceStatus::Sick | AttendanceStatus::Excused | AttendanceStatus::Absent
        )
    }
}

impl Category for AttendanceStatus {
    const ALL: &'static [Self] = &[
        AttendanceStatus::Present,
        AttendanceStatus::Sick,
        AttendanceStatus::Excused,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
    ];

    fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Sick => "Sick",
            AttendanceStatus::Excused => "Excused",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttendanceStatus {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_label(value, "attendance status")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeType {
    Assignment,
    Midterm,
    Final,
    Practical,
}

impl Category for GradeType {
    const ALL: &'static [Self] = &[
        GradeType::Assignment,
        GradeType::Midterm,
        GradeType::Final,
        GradeType::Practical,
    ];

    fn label(self) -> &'static str {
        match self {
            GradeType::Assignment => "Assignment",
            GradeType::Midterm => "Midterm",
            GradeType::Final => "Final",
            GradeType::Practical => "Practical",
        }
    }
}

impl fmt::Display for GradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GradeType {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_label(value, "grade type")
    }
}

fn parse_label<C: Category>(value: &str, what: &'static str) -> Result<C, ParseLabelError> {
    let trimmed = value.trim();
    C::ALL
        .iter()
        .copied()
        .find(|candidate| candidate.label().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| ParseLabelError {
            what,
            value: trimmed.to_string(),
        })
}

/// The fixed set of report shapes the engine can assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    Grades,
    Attendance,
    TeacherPerformance,
    ClassPerformance,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Grades => "grades",
            ReportKind::Attendance => "attendance",
            ReportKind::TeacherPerformance => "teacher-performance",
            ReportKind::ClassPerformance => "class-performance",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Foreign attributes carried by a grade or attendance row once the
/// student, class, subject and teacher joins have been resolved. Any of them
/// may be missing when the referenced row was deleted after the fact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    pub student_id: Option<Uuid>,
    pub student_name: Option<String>,
    pub student_code: Option<String>,
    pub class_id: Option<Uuid>,
    pub class_name: Option<String>,
    pub subject_id: Option<Uuid>,
    pub subject_name: Option<String>,
    pub teacher_name: Option<String>,
    pub academic_year_id: Option<Uuid>,
    pub semester: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    #[serde(flatten)]
    pub joined: Joined,
    pub grade_type: Option<GradeType>,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(flatten)]
    pub joined: Joined,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
}

/// One assignment handed out by a teacher, or a scheduled class/subject slot
/// for which no assignment exists yet (`assignment_id` is `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingRecord {
    pub teacher_id: Option<Uuid>,
    pub teacher_name: Option<String>,
    pub class_id: Option<Uuid>,
    pub class_name: Option<String>,
    pub subject_id: Option<Uuid>,
    pub subject_name: Option<String>,
    pub assignment_id: Option<Uuid>,
    pub assignment_title: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub submission_count: u32,
}

/// Access to the resolved joins of a student-level record.
pub trait HasJoined {
    fn joined(&self) -> &Joined;
}

impl HasJoined for GradeRecord {
    fn joined(&self) -> &Joined {
        &self.joined
    }
}

impl HasJoined for AttendanceRecord {
    fn joined(&self) -> &Joined {
        &self.joined
    }
}

pub trait ClassScoped {
    fn class_id(&self) -> Option<Uuid>;
}

impl ClassScoped for GradeRecord {
    fn class_id(&self) -> Option<Uuid> {
        self.joined.class_id
    }
}

impl ClassScoped for AttendanceRecord {
    fn class_id(&self) -> Option<Uuid> {
        self.joined.class_id
    }
}

impl ClassScoped for TeachingRecord {
    fn class_id(&self) -> Option<Uuid> {
        self.class_id
    }
}

/// Filter values a report was requested with. Date and subject filters are
/// applied by the query; the engine only echoes them in the summary header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
}

impl ReportFilters {
    /// Restricts rows to the requested class using the class id resolved by
    /// the join. Rows whose class could not be resolved are dropped when a
    /// class is requested, since they cannot be shown to belong to it.
    pub fn scope<T: ClassScoped>(&self, records: Vec<T>) -> Vec<T> {
        match self.class_id {
            None => records,
            Some(class_id) => records
                .into_iter()
                .filter(|record| record.class_id() == Some(class_id))
                .collect(),
        }
    }
}

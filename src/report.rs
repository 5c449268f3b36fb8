//! Report assembly.
//!
//! Every report is computed from one in-memory record set: the global
//! summary first, then subject, student (with a nested subject level) and
//! the report's categorical dimension. Nothing here performs I/O or fails;
//! an empty record set produces zeroed summaries and empty maps.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::group::{distinct_count, group, keys, unknown_count, UNKNOWN};
use crate::models::{
    AttendanceRecord, GradeRecord, HasJoined, ReportFilters, ReportKind, TeachingRecord,
};
use crate::rounding::ratio_text;
use crate::stats::{
    attendance_rates, summarize, summarize_categorical, AttendanceRates, CategoricalSummary,
    CategoryStat, NumericSummary,
};

/// Already-joined rows for one report invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    Grades(Vec<GradeRecord>),
    Attendance(Vec<AttendanceRecord>),
    TeacherPerformance(Vec<TeachingRecord>),
    ClassPerformance {
        grades: Vec<GradeRecord>,
        attendance: Vec<AttendanceRecord>,
    },
}

impl RecordSet {
    pub fn empty(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Grades => RecordSet::Grades(Vec::new()),
            ReportKind::Attendance => RecordSet::Attendance(Vec::new()),
            ReportKind::TeacherPerformance => RecordSet::TeacherPerformance(Vec::new()),
            ReportKind::ClassPerformance => RecordSet::ClassPerformance {
                grades: Vec::new(),
                attendance: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            RecordSet::Grades(_) => ReportKind::Grades,
            RecordSet::Attendance(_) => ReportKind::Attendance,
            RecordSet::TeacherPerformance(_) => ReportKind::TeacherPerformance,
            RecordSet::ClassPerformance { .. } => ReportKind::ClassPerformance,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::Grades(records) => records.len(),
            RecordSet::Attendance(records) => records.len(),
            RecordSet::TeacherPerformance(records) => records.len(),
            RecordSet::ClassPerformance { grades, attendance } => grades.len() + attendance.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies the class filter to the materialized rows.
    pub fn scoped(self, filters: &ReportFilters) -> Self {
        match self {
            RecordSet::Grades(records) => RecordSet::Grades(filters.scope(records)),
            RecordSet::Attendance(records) => RecordSet::Attendance(filters.scope(records)),
            RecordSet::TeacherPerformance(records) => {
                RecordSet::TeacherPerformance(filters.scope(records))
            }
            RecordSet::ClassPerformance { grades, attendance } => RecordSet::ClassPerformance {
                grades: filters.scope(grades),
                attendance: filters.scope(attendance),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Grades(GradeReport),
    Attendance(AttendanceReport),
    TeacherPerformance(TeacherReport),
    ClassPerformance(ClassReport),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Grades(_) => ReportKind::Grades,
            Report::Attendance(_) => ReportKind::Attendance,
            Report::TeacherPerformance(_) => ReportKind::TeacherPerformance,
            Report::ClassPerformance(_) => ReportKind::ClassPerformance,
        }
    }
}

pub fn build_report(records: RecordSet, filters: &ReportFilters) -> Report {
    debug!(kind = %records.kind(), records = records.len(), "assembling report");
    match records {
        RecordSet::Grades(records) => Report::Grades(grade_report(records, filters)),
        RecordSet::Attendance(records) => Report::Attendance(attendance_report(records, filters)),
        RecordSet::TeacherPerformance(records) => {
            Report::TeacherPerformance(teacher_report(records, filters))
        }
        RecordSet::ClassPerformance { grades, attendance } => {
            Report::ClassPerformance(class_report(grades, attendance, filters))
        }
    }
}

fn label(value: Option<&str>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn resolved_len<V>(map: &IndexMap<String, V>) -> usize {
    map.keys().filter(|key| key.as_str() != UNKNOWN).count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdentity {
    pub student_id: Option<Uuid>,
    pub student_name: String,
    pub student_code: Option<String>,
    pub class_name: String,
}

impl StudentIdentity {
    fn of<T: HasJoined>(bucket: &[&T]) -> Self {
        let joined = bucket.first().map(|record| record.joined());
        Self {
            student_id: joined.and_then(|j| j.student_id),
            student_name: label(joined.and_then(|j| j.student_name.as_deref())),
            student_code: joined.and_then(|j| j.student_code.clone()),
            class_name: label(joined.and_then(|j| j.class_name.as_deref())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSummary {
    pub total_grades: usize,
    pub total_students: usize,
    pub total_subjects: usize,
    pub average_score: String,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub filters: ReportFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGrades {
    pub subject_id: Option<Uuid>,
    pub subject_name: String,
    #[serde(flatten)]
    pub stats: NumericSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGrades {
    #[serde(flatten)]
    pub student: StudentIdentity,
    #[serde(flatten)]
    pub stats: NumericSummary,
    pub by_subject: IndexMap<String, SubjectGrades>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub summary: GradeSummary,
    pub by_subject: IndexMap<String, SubjectGrades>,
    pub by_student: IndexMap<String, StudentGrades>,
    pub by_grade_type: IndexMap<String, NumericSummary>,
    pub details: Vec<GradeRecord>,
}

fn score_summary(bucket: &[&GradeRecord]) -> NumericSummary {
    summarize(bucket.iter().map(|record| record.score))
}

fn subject_grades<'a, I>(records: I) -> IndexMap<String, SubjectGrades>
where
    I: IntoIterator<Item = &'a GradeRecord>,
{
    group(records, keys::subject)
        .into_iter()
        .map(|(key, bucket)| {
            let entry = SubjectGrades {
                subject_id: bucket.iter().find_map(|record| record.joined.subject_id),
                subject_name: key.clone(),
                stats: score_summary(&bucket),
            };
            (key, entry)
        })
        .collect()
}

pub fn grade_report(records: Vec<GradeRecord>, filters: &ReportFilters) -> GradeReport {
    let overall = summarize(records.iter().map(|record| record.score));
    let by_subject = subject_grades(&records);

    let students = group(&records, keys::student);
    let unresolved = unknown_count(&students);
    if unresolved > 0 {
        warn!(records = unresolved, "grade records without a resolvable student");
    }
    let by_student: IndexMap<String, StudentGrades> = students
        .into_iter()
        .map(|(key, bucket)| {
            let entry = StudentGrades {
                student: StudentIdentity::of(&bucket),
                stats: score_summary(&bucket),
                by_subject: subject_grades(bucket.iter().copied()),
            };
            (key, entry)
        })
        .collect();

    let by_grade_type = group(&records, keys::grade_type)
        .into_iter()
        .map(|(key, bucket)| (key, score_summary(&bucket)))
        .collect();

    let summary = GradeSummary {
        total_grades: overall.count,
        total_students: resolved_len(&by_student),
        total_subjects: resolved_len(&by_subject),
        average_score: overall.average,
        highest_score: overall.max,
        lowest_score: overall.min,
        filters: filters.clone(),
    };
    debug!(
        grades = summary.total_grades,
        subjects = by_subject.len(),
        students = by_student.len(),
        "assembled grade report"
    );

    GradeReport {
        summary,
        by_subject,
        by_student,
        by_grade_type,
        details: records,
    }
}

/// Per-status counts of a group of attendance marks together with the
/// derived attendance and absence rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceBreakdown {
    #[serde(flatten)]
    pub rates: AttendanceRates,
    #[serde(flatten)]
    pub statuses: CategoricalSummary,
}

fn breakdown<'a, I>(records: I) -> AttendanceBreakdown
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let statuses = summarize_categorical(records, |record: &AttendanceRecord| record.status);
    AttendanceBreakdown {
        rates: attendance_rates(&statuses),
        statuses,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_records: usize,
    pub total_students: usize,
    /// Count per status, every status listed in declaration order.
    #[serde(flatten)]
    pub statuses: IndexMap<&'static str, usize>,
    #[serde(flatten)]
    pub rates: AttendanceRates,
    pub filters: ReportFilters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttendance {
    pub subject_id: Option<Uuid>,
    pub subject_name: String,
    #[serde(flatten)]
    pub breakdown: AttendanceBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendance {
    #[serde(flatten)]
    pub student: StudentIdentity,
    #[serde(flatten)]
    pub breakdown: AttendanceBreakdown,
    pub by_subject: IndexMap<String, SubjectAttendance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub summary: AttendanceSummary,
    pub by_subject: IndexMap<String, SubjectAttendance>,
    pub by_student: IndexMap<String, StudentAttendance>,
    pub by_status: IndexMap<&'static str, CategoryStat>,
    pub by_date: IndexMap<String, AttendanceBreakdown>,
    pub details: Vec<AttendanceRecord>,
}

fn subject_attendance<'a, I>(records: I) -> IndexMap<String, SubjectAttendance>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    group(records, keys::subject)
        .into_iter()
        .map(|(key, bucket)| {
            let entry = SubjectAttendance {
                subject_id: bucket.iter().find_map(|record| record.joined.subject_id),
                subject_name: key.clone(),
                breakdown: breakdown(bucket.iter().copied()),
            };
            (key, entry)
        })
        .collect()
}

pub fn attendance_report(records: Vec<AttendanceRecord>, filters: &ReportFilters) -> AttendanceReport {
    let overall = breakdown(&records);
    let by_subject = subject_attendance(&records);

    let students = group(&records, keys::student);
    let unresolved = unknown_count(&students);
    if unresolved > 0 {
        warn!(records = unresolved, "attendance records without a resolvable student");
    }
    let by_student: IndexMap<String, StudentAttendance> = students
        .into_iter()
        .map(|(key, bucket)| {
            let entry = StudentAttendance {
                student: StudentIdentity::of(&bucket),
                breakdown: breakdown(bucket.iter().copied()),
                by_subject: subject_attendance(bucket.iter().copied()),
            };
            (key, entry)
        })
        .collect();

    let by_status = overall.statuses.categories.clone();
    let by_date = group(&records, keys::date)
        .into_iter()
        .map(|(key, bucket)| (key, breakdown(bucket.iter().copied())))
        .collect();

    let summary = AttendanceSummary {
        total_records: overall.statuses.total,
        total_students: resolved_len(&by_student),
        statuses: by_status
            .iter()
            .map(|(&status, stat)| (status, stat.count))
            .collect(),
        rates: overall.rates,
        filters: filters.clone(),
    };
    debug!(
        records = summary.total_records,
        subjects = by_subject.len(),
        students = by_student.len(),
        "assembled attendance report"
    );

    AttendanceReport {
        summary,
        by_subject,
        by_student,
        by_status,
        by_date,
        details: records,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub total_teachers: usize,
    pub total_assignments: usize,
    pub total_submissions: u64,
    pub submission_ratio: String,
    pub filters: ReportFilters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherPerformance {
    pub teacher_id: Option<Uuid>,
    pub teacher_name: String,
    pub classes_taught: usize,
    pub subjects_taught: usize,
    pub teaching_loads: usize,
    pub total_assignments: usize,
    pub total_submissions: u64,
    pub submission_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherReport {
    pub summary: TeacherSummary,
    pub by_teacher: IndexMap<String, TeacherPerformance>,
    pub details: Vec<TeachingRecord>,
}

fn assignment_totals(records: &[&TeachingRecord]) -> (usize, u64) {
    records
        .iter()
        .filter(|record| record.assignment_id.is_some())
        .fold((0, 0), |(assignments, submissions), record| {
            (assignments + 1, submissions + u64::from(record.submission_count))
        })
}

fn teacher_performance(bucket: &[&TeachingRecord]) -> TeacherPerformance {
    let first = bucket.first();
    let (total_assignments, total_submissions) = assignment_totals(bucket);
    TeacherPerformance {
        teacher_id: first.and_then(|record| record.teacher_id),
        teacher_name: label(first.and_then(|record| record.teacher_name.as_deref())),
        classes_taught: distinct_count(bucket.iter().map(|record| {
            record
                .class_id
                .map(|id| id.to_string())
                .or_else(|| record.class_name.clone())
        })),
        subjects_taught: distinct_count(bucket.iter().map(|record| {
            record
                .subject_id
                .map(|id| id.to_string())
                .or_else(|| record.subject_name.clone())
        })),
        teaching_loads: distinct_count(bucket.iter().map(|record| keys::teaching_load(record))),
        total_assignments,
        total_submissions,
        submission_ratio: ratio_text(total_submissions as f64, total_assignments as f64),
    }
}

pub fn teacher_report(records: Vec<TeachingRecord>, filters: &ReportFilters) -> TeacherReport {
    let teachers = group(&records, keys::teacher);
    let unresolved = unknown_count(&teachers);
    if unresolved > 0 {
        warn!(records = unresolved, "teaching records without a resolvable teacher");
    }
    let by_teacher: IndexMap<String, TeacherPerformance> = teachers
        .into_iter()
        .map(|(key, bucket)| (key, teacher_performance(&bucket)))
        .collect();

    let all: Vec<&TeachingRecord> = records.iter().collect();
    let (total_assignments, total_submissions) = assignment_totals(&all);
    let summary = TeacherSummary {
        total_teachers: resolved_len(&by_teacher),
        total_assignments,
        total_submissions,
        submission_ratio: ratio_text(total_submissions as f64, total_assignments as f64),
        filters: filters.clone(),
    };
    debug!(
        teachers = by_teacher.len(),
        assignments = total_assignments,
        "assembled teacher performance report"
    );

    TeacherReport {
        summary,
        by_teacher,
        details: records,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub total_classes: usize,
    pub total_students: usize,
    pub average_score: String,
    #[serde(flatten)]
    pub rates: AttendanceRates,
    pub filters: ReportFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPerformance {
    pub class_id: Option<Uuid>,
    pub class_name: String,
    pub total_students: usize,
    pub subject_count: usize,
    pub grades: NumericSummary,
    #[serde(flatten)]
    pub rates: AttendanceRates,
    pub attendance_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetails {
    pub grades: Vec<GradeRecord>,
    pub attendance: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReport {
    pub summary: ClassSummary,
    pub by_class: IndexMap<String, ClassPerformance>,
    pub details: ClassDetails,
}

fn class_performance(
    class_name: &str,
    grades: &[&GradeRecord],
    attendance: &[&AttendanceRecord],
) -> ClassPerformance {
    let class_id = grades
        .iter()
        .find_map(|record| record.joined.class_id)
        .or_else(|| attendance.iter().find_map(|record| record.joined.class_id));
    let marks = breakdown(attendance.iter().copied());

    ClassPerformance {
        class_id,
        class_name: class_name.to_string(),
        total_students: distinct_count(
            grades
                .iter()
                .map(|record| keys::class_student(*record))
                .chain(attendance.iter().map(|record| keys::class_student(*record))),
        ),
        subject_count: distinct_count(grades.iter().map(|record| keys::subject(*record))),
        grades: score_summary(grades),
        rates: marks.rates,
        attendance_records: marks.statuses.total,
    }
}

pub fn class_report(
    grades: Vec<GradeRecord>,
    attendance: Vec<AttendanceRecord>,
    filters: &ReportFilters,
) -> ClassReport {
    let grade_classes = group(&grades, keys::class);
    let attendance_classes = group(&attendance, keys::class);

    // classes with grades come first, then classes only seen in attendance
    let class_names: IndexSet<&String> = grade_classes
        .keys()
        .chain(attendance_classes.keys())
        .collect();
    let by_class: IndexMap<String, ClassPerformance> = class_names
        .into_iter()
        .map(|name| {
            let class_grades = grade_classes.get(name).map(Vec::as_slice).unwrap_or(&[]);
            let class_marks = attendance_classes
                .get(name)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            (
                name.clone(),
                class_performance(name, class_grades, class_marks),
            )
        })
        .collect();

    let overall_grades = summarize(grades.iter().map(|record| record.score));
    let overall_marks = breakdown(&attendance);
    let summary = ClassSummary {
        total_classes: resolved_len(&by_class),
        total_students: distinct_count(
            grades
                .iter()
                .map(|record| record.joined.student_id)
                .chain(attendance.iter().map(|record| record.joined.student_id))
                .map(|id| id.map(|id| id.to_string())),
        ),
        average_score: overall_grades.average,
        rates: overall_marks.rates,
        filters: filters.clone(),
    };
    debug!(
        classes = by_class.len(),
        grades = grades.len(),
        attendance = attendance.len(),
        "assembled class performance report"
    );

    ClassReport {
        summary,
        by_class,
        details: ClassDetails { grades, attendance },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, GradeType, Joined};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn student(id: Uuid, name: &str, class: Option<(Uuid, &str)>) -> Joined {
        Joined {
            student_id: Some(id),
            student_name: Some(name.to_string()),
            student_code: Some(format!("S-{}", &id.to_string()[..4])),
            class_id: class.map(|(id, _)| id),
            class_name: class.map(|(_, name)| name.to_string()),
            ..Joined::default()
        }
    }

    fn grade(joined: &Joined, subject: &str, grade_type: GradeType, score: f64) -> GradeRecord {
        GradeRecord {
            joined: Joined {
                subject_name: Some(subject.to_string()),
                ..joined.clone()
            },
            grade_type: Some(grade_type),
            score,
            created_at: Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap(),
        }
    }

    fn mark(joined: &Joined, status: AttendanceStatus, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            joined: joined.clone(),
            status,
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
        }
    }

    fn teaching(
        teacher: Option<(Uuid, &str)>,
        class: Uuid,
        subject: Uuid,
        submissions: Option<u32>,
    ) -> TeachingRecord {
        TeachingRecord {
            teacher_id: teacher.map(|(id, _)| id),
            teacher_name: teacher.map(|(_, name)| name.to_string()),
            class_id: Some(class),
            class_name: Some("10-A".to_string()),
            subject_id: Some(subject),
            subject_name: Some("Mathematics".to_string()),
            assignment_id: submissions.map(|_| Uuid::new_v4()),
            assignment_title: submissions.map(|_| "Worksheet".to_string()),
            due_date: None,
            submission_count: submissions.unwrap_or(0),
        }
    }

    #[test]
    fn grade_report_nests_subjects_within_students() {
        let s1 = student(Uuid::new_v4(), "Ana Ruiz", None);
        let s2 = student(Uuid::new_v4(), "Ben Cho", None);
        let records = vec![
            grade(&s1, "Math", GradeType::Assignment, 80.0),
            grade(&s1, "Math", GradeType::Midterm, 90.0),
            grade(&s2, "Math", GradeType::Assignment, 70.0),
        ];
        let s1_key = s1.student_id.unwrap().to_string();

        let report = grade_report(records, &ReportFilters::default());
        assert_eq!(report.by_subject["Math"].stats.average, "80.00");
        assert_eq!(report.by_student[&s1_key].stats.average, "85.00");
        assert_eq!(
            report.by_student[&s1_key].by_subject["Math"].stats.average,
            "85.00"
        );
        assert_eq!(report.summary.average_score, "80.00");
        assert_eq!(report.summary.total_students, 2);
        assert_eq!(report.summary.highest_score, 90.0);
        assert_eq!(report.summary.lowest_score, 70.0);
        assert_eq!(report.by_grade_type["Assignment"].average, "75.00");
        assert_eq!(report.details.len(), 3);
    }

    #[test]
    fn missing_joins_are_reported_under_unknown() {
        let orphan = Joined::default();
        let records = vec![GradeRecord {
            joined: orphan,
            grade_type: None,
            score: 64.0,
            created_at: Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap(),
        }];

        let report = grade_report(records, &ReportFilters::default());
        let unknown = &report.by_student[UNKNOWN];
        assert_eq!(unknown.student.student_name, UNKNOWN);
        assert_eq!(unknown.student.class_name, UNKNOWN);
        assert_eq!(unknown.stats.count, 1);
        assert_eq!(report.by_subject[UNKNOWN].stats.count, 1);
        assert_eq!(report.by_grade_type[UNKNOWN].count, 1);
        assert_eq!(report.summary.total_students, 0);
        assert_eq!(report.summary.total_grades, 1);
    }

    #[test]
    fn attendance_report_derives_rates_per_student() {
        let s1 = student(Uuid::new_v4(), "Ana Ruiz", None);
        let records = vec![
            mark(&s1, AttendanceStatus::Present, 2),
            mark(&s1, AttendanceStatus::Present, 3),
            mark(&s1, AttendanceStatus::Absent, 4),
            mark(&s1, AttendanceStatus::Present, 5),
        ];
        let key = s1.student_id.unwrap().to_string();

        let report = attendance_report(records, &ReportFilters::default());
        let entry = &report.by_student[&key];
        assert_eq!(entry.breakdown.rates.attendance_percentage, "75.0");
        assert_eq!(entry.breakdown.rates.absent_percentage, "25.0");
        assert_eq!(report.by_status["Present"].count, 3);
        assert_eq!(report.by_status["Absent"].percentage, "25.0");
        assert_eq!(
            report.by_date.keys().cloned().collect::<Vec<_>>(),
            vec!["2026-03-02", "2026-03-03", "2026-03-04", "2026-03-05"]
        );
        assert_eq!(report.by_date["2026-03-04"].rates.absent_percentage, "100.0");
        assert_eq!(report.summary.total_students, 1);
        let statuses: Vec<(&str, usize)> = report
            .summary
            .statuses
            .iter()
            .map(|(&status, &count)| (status, count))
            .collect();
        assert_eq!(
            statuses,
            vec![("Present", 3), ("Sick", 0), ("Excused", 0), ("Absent", 1), ("Late", 0)]
        );
    }

    #[test]
    fn empty_record_sets_produce_zeroed_reports() {
        let filters = ReportFilters::default();
        for kind in [
            ReportKind::Grades,
            ReportKind::Attendance,
            ReportKind::TeacherPerformance,
            ReportKind::ClassPerformance,
        ] {
            let report = build_report(RecordSet::empty(kind), &filters);
            assert_eq!(report.kind(), kind);
            match report {
                Report::Grades(report) => {
                    assert_eq!(report.summary.average_score, "0.00");
                    assert!(report.by_subject.is_empty());
                    assert!(report.by_student.is_empty());
                    assert!(report.by_grade_type.is_empty());
                }
                Report::Attendance(report) => {
                    assert_eq!(report.summary.rates.attendance_percentage, "0.0");
                    assert!(report.by_date.is_empty());
                    assert!(report.by_status.values().all(|stat| stat.percentage == "0.0"));
                }
                Report::TeacherPerformance(report) => {
                    assert_eq!(report.summary.submission_ratio, "0.0");
                    assert!(report.by_teacher.is_empty());
                }
                Report::ClassPerformance(report) => {
                    assert_eq!(report.summary.total_classes, 0);
                    assert_eq!(report.summary.average_score, "0.00");
                    assert!(report.by_class.is_empty());
                }
            }
        }
    }

    #[test]
    fn teacher_report_counts_distinct_classes_and_ratio() {
        let teacher = (Uuid::new_v4(), "Dana Holt");
        let class_a = Uuid::new_v4();
        let class_b = Uuid::new_v4();
        let math = Uuid::new_v4();
        let physics = Uuid::new_v4();
        let records = vec![
            teaching(Some(teacher), class_a, math, Some(20)),
            teaching(Some(teacher), class_a, math, Some(18)),
            teaching(Some(teacher), class_b, physics, Some(9)),
            teaching(Some(teacher), class_b, math, None),
            teaching(None, class_a, physics, Some(3)),
        ];

        let report = teacher_report(records, &ReportFilters::default());
        let entry = &report.by_teacher[&teacher.0.to_string()];
        assert_eq!(entry.teacher_name, "Dana Holt");
        assert_eq!(entry.classes_taught, 2);
        assert_eq!(entry.subjects_taught, 2);
        assert_eq!(entry.teaching_loads, 3);
        assert_eq!(entry.total_assignments, 3);
        assert_eq!(entry.total_submissions, 47);
        assert_eq!(entry.submission_ratio, "15.7");

        assert_eq!(report.by_teacher[UNKNOWN].teacher_name, UNKNOWN);
        assert_eq!(report.summary.total_teachers, 1);
        assert_eq!(report.summary.total_assignments, 4);
        assert_eq!(report.summary.total_submissions, 50);
        assert_eq!(report.summary.submission_ratio, "12.5");
    }

    #[test]
    fn class_report_merges_grade_and_attendance_classes() {
        let class_a = (Uuid::new_v4(), "10-A");
        let class_b = (Uuid::new_v4(), "10-B");
        let ana = student(Uuid::new_v4(), "Ana Ruiz", Some(class_a));
        let ben = student(Uuid::new_v4(), "Ben Cho", Some(class_a));
        let cy = student(Uuid::new_v4(), "Cy Park", Some(class_b));

        let grades = vec![
            grade(&ana, "Math", GradeType::Final, 90.0),
            grade(&ben, "Physics", GradeType::Final, 60.0),
        ];
        let attendance = vec![
            mark(&cy, AttendanceStatus::Present, 2),
            mark(&ana, AttendanceStatus::Present, 2),
            mark(&ana, AttendanceStatus::Sick, 3),
        ];

        let report = class_report(grades, attendance, &ReportFilters::default());
        assert_eq!(
            report.by_class.keys().cloned().collect::<Vec<_>>(),
            vec!["10-A", "10-B"]
        );

        let a = &report.by_class["10-A"];
        assert_eq!(a.class_id, Some(class_a.0));
        assert_eq!(a.total_students, 2);
        assert_eq!(a.subject_count, 2);
        assert_eq!(a.grades.average, "75.00");
        assert_eq!(a.rates.attendance_percentage, "50.0");
        assert_eq!(a.attendance_records, 2);

        let b = &report.by_class["10-B"];
        assert_eq!(b.grades.count, 0);
        assert_eq!(b.grades.average, "0.00");
        assert_eq!(b.rates.attendance_percentage, "100.0");

        assert_eq!(report.summary.total_classes, 2);
        assert_eq!(report.summary.total_students, 3);
        assert_eq!(report.summary.rates.attendance_percentage, "66.7");
    }

    #[test]
    fn scoped_record_set_keeps_only_requested_class() {
        let class_a = (Uuid::new_v4(), "10-A");
        let class_b = (Uuid::new_v4(), "10-B");
        let ana = student(Uuid::new_v4(), "Ana Ruiz", Some(class_a));
        let cy = student(Uuid::new_v4(), "Cy Park", Some(class_b));
        let records = RecordSet::Attendance(vec![
            mark(&ana, AttendanceStatus::Present, 2),
            mark(&cy, AttendanceStatus::Absent, 2),
        ]);
        let filters = ReportFilters {
            class_id: Some(class_a.0),
            ..ReportFilters::default()
        };

        let scoped = records.scoped(&filters);
        assert_eq!(scoped.len(), 1);
        let Report::Attendance(report) = build_report(scoped, &filters) else {
            panic!("expected an attendance report");
        };
        assert_eq!(report.summary.filters.class_id, Some(class_a.0));
        assert_eq!(report.summary.rates.attendance_percentage, "100.0");
    }
}

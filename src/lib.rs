//! Academic reporting: turns joined grade, attendance and teaching rows into
//! grouped statistical reports and CSV exports.

pub mod db;
pub mod error;
pub mod export;
pub mod group;
pub mod models;
pub mod report;
pub mod rounding;
pub mod stats;

pub use error::ReportError;
pub use export::{csv_attachment, to_csv, CsvAttachment};
pub use models::{
    AttendanceRecord, AttendanceStatus, GradeRecord, GradeType, Joined, ReportFilters,
    ReportKind, TeachingRecord,
};
pub use report::{build_report, RecordSet, Report};

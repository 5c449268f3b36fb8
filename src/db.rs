use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    AttendanceRecord, AttendanceStatus, GradeRecord, GradeType, Joined, ReportFilters,
    ReportKind, TeachingRecord,
};
use crate::report::RecordSet;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let year_id = Uuid::parse_str("6f1d6c2e-0b7a-4c55-9a40-5c3c1f1f2a01")?;
    sqlx::query(
        r#"
        INSERT INTO academic_reporting.academic_years (id, label, is_active)
        VALUES ($1, $2, TRUE)
        ON CONFLICT (label) DO NOTHING
        "#,
    )
    .bind(year_id)
    .bind("2025/2026")
    .execute(pool)
    .await?;

    let class_id = upsert_class(pool, "10-A").await?;
    let math_id = upsert_subject(pool, "Mathematics").await?;
    let physics_id = upsert_subject(pool, "Physics").await?;

    let teacher_id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_reporting.teachers (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(Uuid::parse_str("b3c1a7de-5f2e-4a8b-9c1d-2e3f4a5b6c7d")?)
    .bind("Dana Holt")
    .bind("dana.holt@school.example")
    .fetch_one(pool)
    .await?
    .try_get("id")?;

    let students = vec![
        ("STU-001", "Ana Ruiz"),
        ("STU-002", "Ben Cho"),
        ("STU-003", "Cy Park"),
    ];
    let mut student_ids = Vec::new();
    for (code, name) in students {
        student_ids.push((code, upsert_student(pool, code, name, Some(class_id)).await?));
    }

    for subject_id in [math_id, physics_id] {
        sqlx::query(
            r#"
            INSERT INTO academic_reporting.schedules (id, teacher_id, class_id, subject_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (teacher_id, class_id, subject_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(teacher_id)
        .bind(class_id)
        .bind(subject_id)
        .execute(pool)
        .await?;
    }

    let grades = vec![
        ("STU-001", math_id, GradeType::Assignment, 80.0),
        ("STU-001", math_id, GradeType::Midterm, 90.0),
        ("STU-002", math_id, GradeType::Assignment, 70.0),
        ("STU-002", physics_id, GradeType::Practical, 84.5),
        ("STU-003", physics_id, GradeType::Final, 77.0),
    ];
    for (index, (code, subject_id, grade_type, score)) in grades.into_iter().enumerate() {
        let student_id = seeded_student(&student_ids, code)?;
        insert_grade(
            pool,
            NewGrade {
                student_id,
                subject_id,
                teacher_id: Some(teacher_id),
                academic_year_id: Some(year_id),
                semester: Some("1".to_string()),
                grade_type: Some(grade_type),
                score,
                source_key: format!("seed-grade-{:03}", index + 1),
            },
        )
        .await?;
    }

    let attendance = vec![
        ("STU-001", AttendanceStatus::Present, (2026, 3, 2)),
        ("STU-001", AttendanceStatus::Present, (2026, 3, 3)),
        ("STU-001", AttendanceStatus::Absent, (2026, 3, 4)),
        ("STU-001", AttendanceStatus::Present, (2026, 3, 5)),
        ("STU-002", AttendanceStatus::Sick, (2026, 3, 2)),
        ("STU-002", AttendanceStatus::Late, (2026, 3, 3)),
        ("STU-003", AttendanceStatus::Excused, (2026, 3, 2)),
    ];
    for (index, (code, status, (year, month, day))) in attendance.into_iter().enumerate() {
        let student_id = seeded_student(&student_ids, code)?;
        insert_attendance(
            pool,
            NewAttendance {
                student_id,
                subject_id: Some(math_id),
                teacher_id: Some(teacher_id),
                academic_year_id: Some(year_id),
                semester: Some("1".to_string()),
                status,
                date: NaiveDate::from_ymd_opt(year, month, day).context("invalid date")?,
                source_key: format!("seed-attendance-{:03}", index + 1),
            },
        )
        .await?;
    }

    let assignments = vec![
        ("seed-assignment-001", math_id, "Linear equations", 3),
        ("seed-assignment-002", physics_id, "Lab report: pendulum", 2),
    ];
    for (source_key, subject_id, title, submitted) in assignments {
        let assignment_id: Uuid = sqlx::query(
            r#"
            INSERT INTO academic_reporting.assignments
            (id, teacher_id, class_id, subject_id, title, due_date, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO UPDATE SET title = EXCLUDED.title
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(teacher_id)
        .bind(class_id)
        .bind(subject_id)
        .bind(title)
        .bind(NaiveDate::from_ymd_opt(2026, 3, 13).context("invalid date")?)
        .bind(source_key)
        .fetch_one(pool)
        .await?
        .try_get("id")?;

        for (_, student_id) in student_ids.iter().take(submitted) {
            sqlx::query(
                r#"
                INSERT INTO academic_reporting.submissions (id, assignment_id, student_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (assignment_id, student_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(assignment_id)
            .bind(*student_id)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

fn seeded_student(student_ids: &[(&str, Uuid)], code: &str) -> anyhow::Result<Uuid> {
    student_ids
        .iter()
        .find(|(seeded, _)| *seeded == code)
        .map(|(_, id)| *id)
        .with_context(|| format!("seed student {code} missing"))
}

async fn upsert_class(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_reporting.classes (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?
    .try_get("id")?;
    Ok(id)
}

async fn upsert_subject(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_reporting.subjects (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?
    .try_get("id")?;
    Ok(id)
}

async fn upsert_student(
    pool: &PgPool,
    code: &str,
    name: &str,
    class_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_reporting.students (id, full_name, student_code, class_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_code) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            class_id = COALESCE(EXCLUDED.class_id, academic_reporting.students.class_id)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(code)
    .bind(class_id)
    .fetch_one(pool)
    .await?
    .try_get("id")?;
    Ok(id)
}

async fn find_teacher(pool: &PgPool, email: &str) -> anyhow::Result<Option<Uuid>> {
    let row = sqlx::query("SELECT id FROM academic_reporting.teachers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.try_get::<Uuid, _>("id")).transpose()?)
}

struct NewGrade {
    student_id: Uuid,
    subject_id: Uuid,
    teacher_id: Option<Uuid>,
    academic_year_id: Option<Uuid>,
    semester: Option<String>,
    grade_type: Option<GradeType>,
    score: f64,
    source_key: String,
}

/// Returns whether a row was inserted; duplicates by `source_key` are skipped.
async fn insert_grade(pool: &PgPool, grade: NewGrade) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO academic_reporting.grades
        (id, student_id, subject_id, teacher_id, academic_year_id, semester, grade_type, score, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(grade.student_id)
    .bind(grade.subject_id)
    .bind(grade.teacher_id)
    .bind(grade.academic_year_id)
    .bind(grade.semester)
    .bind(grade.grade_type.map(|grade_type| grade_type.to_string()))
    .bind(grade.score)
    .bind(grade.source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

struct NewAttendance {
    student_id: Uuid,
    subject_id: Option<Uuid>,
    teacher_id: Option<Uuid>,
    academic_year_id: Option<Uuid>,
    semester: Option<String>,
    status: AttendanceStatus,
    date: NaiveDate,
    source_key: String,
}

async fn insert_attendance(pool: &PgPool, mark: NewAttendance) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO academic_reporting.attendance
        (id, student_id, subject_id, teacher_id, academic_year_id, semester, status, date, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(mark.student_id)
    .bind(mark.subject_id)
    .bind(mark.teacher_id)
    .bind(mark.academic_year_id)
    .bind(mark.semester)
    .bind(mark.status.to_string())
    .bind(mark.date)
    .bind(mark.source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn import_grades_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_code: String,
        student_name: String,
        class_name: Option<String>,
        subject_name: String,
        teacher_email: Option<String>,
        grade_type: Option<String>,
        score: f64,
        semester: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid grade row {}", line + 1))?;
        let class_id = match row.class_name.as_deref() {
            Some(name) => Some(upsert_class(pool, name).await?),
            None => None,
        };
        let student_id = upsert_student(pool, &row.student_code, &row.student_name, class_id).await?;
        let subject_id = upsert_subject(pool, &row.subject_name).await?;
        let teacher_id = match row.teacher_email.as_deref() {
            Some(email) => {
                let found = find_teacher(pool, email).await?;
                if found.is_none() {
                    warn!(email, "grade row references an unknown teacher");
                }
                found
            }
            None => None,
        };
        let grade_type = row
            .grade_type
            .as_deref()
            .map(str::parse::<GradeType>)
            .transpose()?;

        let added = insert_grade(
            pool,
            NewGrade {
                student_id,
                subject_id,
                teacher_id,
                academic_year_id: None,
                semester: row.semester,
                grade_type,
                score: row.score,
                source_key: row
                    .source_key
                    .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
            },
        )
        .await?;

        if added {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "imported grades");
    Ok(inserted)
}

pub async fn import_attendance_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_code: String,
        student_name: String,
        class_name: Option<String>,
        subject_name: Option<String>,
        status: String,
        date: NaiveDate,
        semester: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid attendance row {}", line + 1))?;
        let class_id = match row.class_name.as_deref() {
            Some(name) => Some(upsert_class(pool, name).await?),
            None => None,
        };
        let student_id = upsert_student(pool, &row.student_code, &row.student_name, class_id).await?;
        let subject_id = match row.subject_name.as_deref() {
            Some(name) => Some(upsert_subject(pool, name).await?),
            None => None,
        };

        let added = insert_attendance(
            pool,
            NewAttendance {
                student_id,
                subject_id,
                teacher_id: None,
                academic_year_id: None,
                semester: row.semester,
                status: row.status.parse::<AttendanceStatus>()?,
                date: row.date,
                source_key: row
                    .source_key
                    .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
            },
        )
        .await?;

        if added {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "imported attendance");
    Ok(inserted)
}

fn joined_from_row(row: &PgRow) -> Result<Joined, sqlx::Error> {
    Ok(Joined {
        student_id: row.try_get("student_id")?,
        student_name: row.try_get("student_name")?,
        student_code: row.try_get("student_code")?,
        class_id: row.try_get("class_id")?,
        class_name: row.try_get("class_name")?,
        subject_id: row.try_get("subject_id")?,
        subject_name: row.try_get("subject_name")?,
        teacher_name: row.try_get("teacher_name")?,
        academic_year_id: row.try_get("academic_year_id")?,
        semester: row.try_get("semester")?,
    })
}

/// Grade rows with every foreign attribute resolved through `LEFT JOIN`s, so
/// a deleted student, class, subject or teacher shows up as `NULL` columns
/// instead of dropping the row.
pub async fn fetch_grade_records(
    pool: &PgPool,
    filters: &ReportFilters,
) -> anyhow::Result<Vec<GradeRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT st.id AS student_id, st.full_name AS student_name, st.student_code,
               c.id AS class_id, c.name AS class_name,
               sb.id AS subject_id, sb.name AS subject_name,
               t.full_name AS teacher_name,
               ay.id AS academic_year_id, g.semester,
               g.grade_type, g.score, g.created_at
        FROM academic_reporting.grades g
        LEFT JOIN academic_reporting.students st ON st.id = g.student_id
        LEFT JOIN academic_reporting.classes c ON c.id = st.class_id
        LEFT JOIN academic_reporting.subjects sb ON sb.id = g.subject_id
        LEFT JOIN academic_reporting.teachers t ON t.id = g.teacher_id
        LEFT JOIN academic_reporting.academic_years ay ON ay.id = g.academic_year_id
        WHERE ($1::date IS NULL OR g.created_at::date >= $1)
          AND ($2::date IS NULL OR g.created_at::date <= $2)
          AND ($3::uuid IS NULL OR g.subject_id = $3)
        ORDER BY g.created_at, g.id
        "#,
    )
    .bind(filters.from)
    .bind(filters.to)
    .bind(filters.subject_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch grade records")?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let grade_type: Option<String> = row.try_get("grade_type")?;
        records.push(GradeRecord {
            joined: joined_from_row(&row)?,
            grade_type: grade_type
                .as_deref()
                .map(str::parse::<GradeType>)
                .transpose()?,
            score: row.try_get("score")?,
            created_at: row.try_get("created_at")?,
        });
    }

    Ok(records)
}

pub async fn fetch_attendance_records(
    pool: &PgPool,
    filters: &ReportFilters,
) -> anyhow::Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT st.id AS student_id, st.full_name AS student_name, st.student_code,
               c.id AS class_id, c.name AS class_name,
               sb.id AS subject_id, sb.name AS subject_name,
               t.full_name AS teacher_name,
               ay.id AS academic_year_id, a.semester,
               a.status, a.date
        FROM academic_reporting.attendance a
        LEFT JOIN academic_reporting.students st ON st.id = a.student_id
        LEFT JOIN academic_reporting.classes c ON c.id = st.class_id
        LEFT JOIN academic_reporting.subjects sb ON sb.id = a.subject_id
        LEFT JOIN academic_reporting.teachers t ON t.id = a.teacher_id
        LEFT JOIN academic_reporting.academic_years ay ON ay.id = a.academic_year_id
        WHERE ($1::date IS NULL OR a.date >= $1)
          AND ($2::date IS NULL OR a.date <= $2)
          AND ($3::uuid IS NULL OR a.subject_id = $3)
        ORDER BY a.date, st.full_name NULLS LAST, a.id
        "#,
    )
    .bind(filters.from)
    .bind(filters.to)
    .bind(filters.subject_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch attendance records")?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let status: String = row.try_get("status")?;
        records.push(AttendanceRecord {
            joined: joined_from_row(&row)?,
            status: status.parse::<AttendanceStatus>()?,
            date: row.try_get("date")?,
        });
    }

    Ok(records)
}

/// One row per assignment with its submission count, plus one row per
/// scheduled class/subject slot that has no assignment yet.
pub async fn fetch_teaching_records(
    pool: &PgPool,
    filters: &ReportFilters,
) -> anyhow::Result<Vec<TeachingRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id AS teacher_id, t.full_name AS teacher_name,
               c.id AS class_id, c.name AS class_name,
               sb.id AS subject_id, sb.name AS subject_name,
               a.id AS assignment_id, a.title AS assignment_title, a.due_date,
               COUNT(s.id) AS submission_count
        FROM academic_reporting.assignments a
        LEFT JOIN academic_reporting.teachers t ON t.id = a.teacher_id
        LEFT JOIN academic_reporting.classes c ON c.id = a.class_id
        LEFT JOIN academic_reporting.subjects sb ON sb.id = a.subject_id
        LEFT JOIN academic_reporting.submissions s ON s.assignment_id = a.id
        WHERE ($1::date IS NULL OR a.due_date >= $1)
          AND ($2::date IS NULL OR a.due_date <= $2)
          AND ($3::uuid IS NULL OR a.subject_id = $3)
        GROUP BY t.id, t.full_name, c.id, c.name, sb.id, sb.name, a.id, a.title, a.due_date
        UNION ALL
        SELECT t.id, t.full_name, c.id, c.name, sb.id, sb.name,
               NULL::uuid, NULL::text, NULL::date, 0::bigint
        FROM academic_reporting.schedules sc
        LEFT JOIN academic_reporting.teachers t ON t.id = sc.teacher_id
        LEFT JOIN academic_reporting.classes c ON c.id = sc.class_id
        LEFT JOIN academic_reporting.subjects sb ON sb.id = sc.subject_id
        WHERE ($3::uuid IS NULL OR sc.subject_id = $3)
          AND NOT EXISTS (
              SELECT 1 FROM academic_reporting.assignments a
              WHERE a.teacher_id = sc.teacher_id
                AND a.class_id = sc.class_id
                AND a.subject_id = sc.subject_id
          )
        ORDER BY teacher_name NULLS LAST, class_name, subject_name, due_date
        "#,
    )
    .bind(filters.from)
    .bind(filters.to)
    .bind(filters.subject_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch teaching records")?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let submission_count: i64 = row.try_get("submission_count")?;
        records.push(TeachingRecord {
            teacher_id: row.try_get("teacher_id")?,
            teacher_name: row.try_get("teacher_name")?,
            class_id: row.try_get("class_id")?,
            class_name: row.try_get("class_name")?,
            subject_id: row.try_get("subject_id")?,
            subject_name: row.try_get("subject_name")?,
            assignment_id: row.try_get("assignment_id")?,
            assignment_title: row.try_get("assignment_title")?,
            due_date: row.try_get("due_date")?,
            submission_count: u32::try_from(submission_count)
                .context("submission count out of range")?,
        });
    }

    Ok(records)
}

/// Fetches everything a report kind needs and applies class scoping on the
/// joined rows.
pub async fn fetch_record_set(
    pool: &PgPool,
    kind: ReportKind,
    filters: &ReportFilters,
) -> anyhow::Result<RecordSet> {
    let records = match kind {
        ReportKind::Grades => RecordSet::Grades(fetch_grade_records(pool, filters).await?),
        ReportKind::Attendance => {
            RecordSet::Attendance(fetch_attendance_records(pool, filters).await?)
        }
        ReportKind::TeacherPerformance => {
            RecordSet::TeacherPerformance(fetch_teaching_records(pool, filters).await?)
        }
        ReportKind::ClassPerformance => {
            let (grades, attendance) = tokio::try_join!(
                fetch_grade_records(pool, filters),
                fetch_attendance_records(pool, filters)
            )?;
            RecordSet::ClassPerformance { grades, attendance }
        }
    };

    Ok(records.scoped(filters))
}

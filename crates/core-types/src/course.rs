use crate::error::CoreError;
use crate::value::{Row, SqlValue};
use serde::{Deserialize, Serialize};

/// A single section of a course, as stored in a course catalog table.
///
/// Every field is optional; a row that lacks a column simply leaves the
/// corresponding field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSection {
    pub course_id: Option<i64>,
    pub course_name: Option<String>,
    pub uuid: Option<String>,
    pub created_at: Option<String>,
    pub course_code: Option<String>,
    pub sis_course_id: Option<String>,
    pub course_no: Option<String>,
    pub section: Option<String>,
    pub course_year: Option<String>,
    pub semester: Option<String>,
}

impl CourseSection {
    /// A fully populated sample record, useful for documentation and fixtures.
    pub fn example() -> Self {
        Self {
            course_id: Some(123),
            course_name: Some("Introduction to Python".to_string()),
            uuid: Some("a1b2c3d4-e5f6-7g8h-9i0j-k1l2m3n4o5p6".to_string()),
            created_at: Some("2023-09-02T12:34:56Z".to_string()),
            course_code: Some("PY101".to_string()),
            sis_course_id: Some("SIS001".to_string()),
            course_no: Some("101".to_string()),
            section: Some("A".to_string()),
            course_year: Some("2024".to_string()),
            semester: Some("Fall".to_string()),
        }
    }

    /// Builds a record from a fetched row.
    ///
    /// Columns that are not part of the record are ignored. Text fields also
    /// accept integer columns (e.g. a `YEAR` or `INT` `course_year`), which are
    /// rendered as decimal strings.
    pub fn from_row(row: &Row) -> Result<Self, CoreError> {
        Ok(Self {
            course_id: integer_field(row, "course_id")?,
            course_name: text_field(row, "course_name")?,
            uuid: text_field(row, "uuid")?,
            created_at: text_field(row, "created_at")?,
            course_code: text_field(row, "course_code")?,
            sis_course_id: text_field(row, "sis_course_id")?,
            course_no: text_field(row, "course_no")?,
            section: text_field(row, "section")?,
            course_year: text_field(row, "course_year")?,
            semester: text_field(row, "semester")?,
        })
    }
}

fn integer_field(row: &Row, column: &str) -> Result<Option<i64>, CoreError> {
    match row.get(column) {
        None | Some(SqlValue::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            CoreError::InvalidInput(column.to_string(), format!("expected an integer, got {:?}", value))
        }),
    }
}

fn text_field(row: &Row, column: &str) -> Result<Option<String>, CoreError> {
    match row.get(column) {
        None | Some(SqlValue::Null) => Ok(None),
        Some(SqlValue::Text(s)) => Ok(Some(s.clone())),
        Some(value @ (SqlValue::Int(_) | SqlValue::UInt(_))) => Ok(Some(value.to_string())),
        Some(other) => Err(CoreError::InvalidInput(
            column.to_string(),
            format!("expected text, got {:?}", other),
        )),
    }
}

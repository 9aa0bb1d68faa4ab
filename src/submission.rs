use crate::error::SurveyError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CSV header, in column order
pub const CSV_HEADER: [&str; 7] = [
    "req_date",
    "req_time",
    "department",
    "name",
    "employee_id",
    "software_nm",
    "work_type",
];

/// A software request as posted by the survey form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySubmission {
    pub department: String,
    pub name: String,
    pub employee_id: String,
    pub software: String,
    pub work_type: String,
}

impl SurveySubmission {
    /// Extract a submission from a parsed JSON body
    ///
    /// Every field is required. Numbers and booleans are accepted and stored
    /// as their text form, since employee ids are often sent as numbers.
    pub fn from_json(body: &Value) -> Result<Self, SurveyError> {
        let object = body
            .as_object()
            .ok_or_else(|| SurveyError::InvalidBody("expected a JSON object".to_string()))?;

        let field = |name: &'static str| -> Result<String, SurveyError> {
            match object.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Number(n)) => Ok(n.to_string()),
                Some(Value::Bool(b)) => Ok(b.to_string()),
                Some(Value::Null) | None => Err(SurveyError::MissingField(name)),
                Some(_) => Err(SurveyError::InvalidBody(format!(
                    "field '{}' must be a scalar",
                    name
                ))),
            }
        };

        Ok(Self {
            department: field("department")?,
            name: field("name")?,
            employee_id: field("employee_id")?,
            software: field("software")?,
            work_type: field("work_type")?,
        })
    }

    /// Parse a raw request body
    pub fn from_slice(body: &[u8]) -> Result<Self, SurveyError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| SurveyError::InvalidBody(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Stamp the submission with the time it was received
    pub fn into_row(self, received: NaiveDateTime) -> RequestRow {
        RequestRow {
            req_date: received.format("%Y%m%d").to_string(),
            req_time: received.format("%H:%M:%S").to_string(),
            department: self.department,
            name: self.name,
            employee_id: self.employee_id,
            software_nm: self.software,
            work_type: self.work_type,
        }
    }
}

/// One line of the daily request file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRow {
    pub req_date: String,
    pub req_time: String,
    pub department: String,
    pub name: String,
    pub employee_id: String,
    pub software_nm: String,
    pub work_type: String,
}

impl RequestRow {
    /// (column, value) pairs in header order
    pub fn fields(&self) -> [(&'static str, &str); 7] {
        [
            (CSV_HEADER[0], self.req_date.as_str()),
            (CSV_HEADER[1], self.req_time.as_str()),
            (CSV_HEADER[2], self.department.as_str()),
            (CSV_HEADER[3], self.name.as_str()),
            (CSV_HEADER[4], self.employee_id.as_str()),
            (CSV_HEADER[5], self.software_nm.as_str()),
            (CSV_HEADER[6], self.work_type.as_str()),
        ]
    }
}

//! The student intake form and the rules that read it directly.

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::input::{coerce_flag, PredictionInput};

pub const MARITAL_STATUSES: [&str; 6] = ["Single", "Married", "Divorced", "Widowed", "Other", "Unknown"];

/// Attributes collected for a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentForm {
    pub age_at_enrollment: u32,
    pub gender: String,
    /// 1-based index into [`MARITAL_STATUSES`].
    pub marital_status: u32,
    pub tuition_fees_up_to_date: String,
    pub scholarship_holder: String,
    pub previous_qualification_grade: f64,
    pub admission_grade: f64,
    pub first_semester_grade: f64,
    pub second_semester_grade: f64,
}

impl Default for StudentForm {
    fn default() -> Self {
        Self {
            age_at_enrollment: 20,
            gender: "Female".to_string(),
            marital_status: 1,
            tuition_fees_up_to_date: "No".to_string(),
            scholarship_holder: "No".to_string(),
            previous_qualification_grade: 120.0,
            admission_grade: 130.0,
            first_semester_grade: 12.0,
            second_semester_grade: 12.0,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), InputError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputError::OutOfRange { field, min, max, value })
    }
}

fn gender_code(gender: &str) -> Result<f64, InputError> {
    match gender.trim() {
        "Male" => Ok(1.0),
        "Female" => Ok(0.0),
        other => Err(InputError::Unsupported {
            field: "gender".to_string(),
            value: other.to_string(),
        }),
    }
}

impl StudentForm {
    pub fn validate(&self) -> Result<(), InputError> {
        check_range("age_at_enrollment", f64::from(self.age_at_enrollment), 17.0, 35.0)?;
        check_range("marital_status", f64::from(self.marital_status), 1.0, 6.0)?;
        check_range("previous_qualification_grade", self.previous_qualification_grade, 50.0, 200.0)?;
        check_range("admission_grade", self.admission_grade, 50.0, 200.0)?;
        check_range("first_semester_grade", self.first_semester_grade, 0.0, 20.0)?;
        check_range("second_semester_grade", self.second_semester_grade, 0.0, 20.0)?;
        gender_code(&self.gender)?;
        coerce_flag(&self.tuition_fees_up_to_date)?;
        coerce_flag(&self.scholarship_holder)?;
        Ok(())
    }

    pub fn marital_status_label(&self) -> Option<&'static str> {
        let index = usize::try_from(self.marital_status).ok()?.checked_sub(1)?;
        MARITAL_STATUSES.get(index).copied()
    }

    /// Builds the model input under the feature names used at training time.
    pub fn to_input(&self) -> Result<PredictionInput, InputError> {
        self.validate()?;

        let mut input = PredictionInput::new();
        input.insert("Age_at_enrollment", f64::from(self.age_at_enrollment));
        input.insert("Gender", gender_code(&self.gender)?);
        input.insert("Marital_status", f64::from(self.marital_status));
        input.insert("Tuition_fees_up_to_date", coerce_flag(&self.tuition_fees_up_to_date)?);
        input.insert("Scholarship_holder", coerce_flag(&self.scholarship_holder)?);
        input.insert("Previous_qualification_grade", self.previous_qualification_grade);
        input.insert("Admission_grade", self.admission_grade);
        input.insert("Curricular_units_1st_sem_grade", self.first_semester_grade);
        input.insert("Curricular_units_2nd_sem_grade", self.second_semester_grade);
        Ok(input)
    }

    /// Warning signs read straight off the form, independent of the model.
    pub fn risk_factors(&self) -> Vec<&'static str> {
        let mut factors = Vec::new();

        if self.first_semester_grade < 10.0 {
            factors.push("Low 1st semester grade");
        }
        if self.second_semester_grade < 10.0 {
            factors.push("Low 2nd semester grade");
        }
        if coerce_flag(&self.tuition_fees_up_to_date) != Ok(1.0) {
            factors.push("Tuition payment issues");
        }
        if self.age_at_enrollment > 25 {
            factors.push("Older enrollment age");
        }

        factors
    }
}

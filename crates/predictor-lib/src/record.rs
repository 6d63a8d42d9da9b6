//! Student record schema
//!
//! The fitted preprocessor expects exactly 36 named fields per record. The
//! form collects 29 of them; the remaining 7 are filled with the constants
//! in [`defaults`]. Serde names are the preprocessor's column names, so a
//! serialized record matches the fitted schema byte-for-byte.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Valid code range for `Marital_status`.
pub const MARITAL_STATUS_CODES: RangeInclusive<u16> = 1..=5;

/// Valid code range for `Application_mode`.
pub const APPLICATION_MODE_CODES: RangeInclusive<u16> = 1..=50;

/// Valid code range for `Previous_qualification` and both parents' qualification.
pub const QUALIFICATION_CODES: RangeInclusive<u16> = 1..=50;

/// Valid code range for `Nacionality`.
pub const NACIONALITY_CODES: RangeInclusive<u16> = 1..=100;

/// Accepted enrollment age, inclusive on both ends.
pub const AGE_AT_ENROLLMENT: RangeInclusive<u16> = 15..=80;

/// Semester average grade scale, inclusive on both ends.
pub const SEMESTER_GRADE: RangeInclusive<f32> = 0.0..=20.0;

/// Fixed fill values for schema fields the form does not collect.
///
/// These are an information gap, not tuning knobs: predictions never reflect
/// real values for these fields, and the zero admission grades are likely
/// out-of-domain for a grade scaled 0-200 in the training data. They are kept
/// as named constants so the gap stays visible.
pub mod defaults {
    /// `Mothers_occupation` occupation code.
    pub const MOTHERS_OCCUPATION: u16 = 0;
    /// `Fathers_occupation` occupation code.
    pub const FATHERS_OCCUPATION: u16 = 0;
    /// `Curricular_units_1st_sem_credited` count.
    pub const CREDITED_UNITS_1ST_SEM: u16 = 0;
    /// `Curricular_units_2nd_sem_credited` count.
    pub const CREDITED_UNITS_2ND_SEM: u16 = 0;
    /// `Displaced` flag.
    pub const DISPLACED: u8 = 0;
    /// `Previous_qualification_grade` on the 0-200 scale.
    pub const PREVIOUS_QUALIFICATION_GRADE: f32 = 0.0;
    /// `Admission_grade` on the 0-200 scale.
    pub const ADMISSION_GRADE: f32 = 0.0;
}

/// The 29 fields collected from the user, one per form control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentForm {
    #[serde(rename = "Marital_status")]
    pub marital_status: u16,
    #[serde(rename = "Application_mode")]
    pub application_mode: u16,
    #[serde(rename = "Application_order")]
    pub application_order: u16,
    #[serde(rename = "Course")]
    pub course: u16,
    #[serde(rename = "Daytime_evening_attendance")]
    pub daytime_evening_attendance: u8,
    #[serde(rename = "Previous_qualification")]
    pub previous_qualification: u16,
    #[serde(rename = "Nacionality")]
    pub nacionality: u16,
    #[serde(rename = "Mothers_qualification")]
    pub mothers_qualification: u16,
    #[serde(rename = "Fathers_qualification")]
    pub fathers_qualification: u16,
    #[serde(rename = "Educational_special_needs")]
    pub educational_special_needs: u8,
    #[serde(rename = "Debtor")]
    pub debtor: u8,
    #[serde(rename = "Tuition_fees_up_to_date")]
    pub tuition_fees_up_to_date: u8,
    #[serde(rename = "Gender")]
    pub gender: u8,
    #[serde(rename = "Scholarship_holder")]
    pub scholarship_holder: u8,
    #[serde(rename = "Age_at_enrollment")]
    pub age_at_enrollment: u16,
    #[serde(rename = "International")]
    pub international: u8,
    #[serde(rename = "Curricular_units_1st_sem_enrolled")]
    pub curricular_units_1st_sem_enrolled: u16,
    #[serde(rename = "Curricular_units_1st_sem_evaluations")]
    pub curricular_units_1st_sem_evaluations: u16,
    #[serde(rename = "Curricular_units_1st_sem_approved")]
    pub curricular_units_1st_sem_approved: u16,
    #[serde(rename = "Curricular_units_1st_sem_grade")]
    pub curricular_units_1st_sem_grade: f32,
    #[serde(rename = "Curricular_units_1st_sem_without_evaluations")]
    pub curricular_units_1st_sem_without_evaluations: u16,
    #[serde(rename = "Curricular_units_2nd_sem_enrolled")]
    pub curricular_units_2nd_sem_enrolled: u16,
    #[serde(rename = "Curricular_units_2nd_sem_evaluations")]
    pub curricular_units_2nd_sem_evaluations: u16,
    #[serde(rename = "Curricular_units_2nd_sem_approved")]
    pub curricular_units_2nd_sem_approved: u16,
    #[serde(rename = "Curricular_units_2nd_sem_grade")]
    pub curricular_units_2nd_sem_grade: f32,
    #[serde(rename = "Curricular_units_2nd_sem_without_evaluations")]
    pub curricular_units_2nd_sem_without_evaluations: u16,
    #[serde(rename = "Unemployment_rate")]
    pub unemployment_rate: f32,
    #[serde(rename = "Inflation_rate")]
    pub inflation_rate: f32,
    #[serde(rename = "GDP")]
    pub gdp: f32,
}

impl StudentForm {
    /// Check every field against its documented domain. There is no
    /// cross-field validation; each control stands alone.
    pub fn validate(&self) -> Result<(), PredictError> {
        check_code("Marital_status", self.marital_status, &MARITAL_STATUS_CODES)?;
        check_code(
            "Application_mode",
            self.application_mode,
            &APPLICATION_MODE_CODES,
        )?;
        check_code("Course", self.course, &(1..=u16::MAX))?;
        check_flag(
            "Daytime_evening_attendance",
            self.daytime_evening_attendance,
        )?;
        check_code(
            "Previous_qualification",
            self.previous_qualification,
            &QUALIFICATION_CODES,
        )?;
        check_code("Nacionality", self.nacionality, &NACIONALITY_CODES)?;
        check_code(
            "Mothers_qualification",
            self.mothers_qualification,
            &QUALIFICATION_CODES,
        )?;
        check_code(
            "Fathers_qualification",
            self.fathers_qualification,
            &QUALIFICATION_CODES,
        )?;
        check_flag("Educational_special_needs", self.educational_special_needs)?;
        check_flag("Debtor", self.debtor)?;
        check_flag("Tuition_fees_up_to_date", self.tuition_fees_up_to_date)?;
        check_flag("Gender", self.gender)?;
        check_flag("Scholarship_holder", self.scholarship_holder)?;
        check_code("Age_at_enrollment", self.age_at_enrollment, &AGE_AT_ENROLLMENT)?;
        check_flag("International", self.international)?;
        check_grade(
            "Curricular_units_1st_sem_grade",
            self.curricular_units_1st_sem_grade,
        )?;
        check_grade(
            "Curricular_units_2nd_sem_grade",
            self.curricular_units_2nd_sem_grade,
        )?;
        check_finite("Unemployment_rate", self.unemployment_rate)?;
        check_finite("Inflation_rate", self.inflation_rate)?;
        check_finite("GDP", self.gdp)?;
        Ok(())
    }
}

impl StudentForm {
    /// Representative filled-in form, used as the CLI input template and in
    /// tests. Values mirror the form's own suggested defaults.
    pub fn sample() -> Self {
        Self {
            marital_status: 1,
            application_mode: 1,
            application_order: 1,
            course: 33,
            daytime_evening_attendance: 1,
            previous_qualification: 1,
            nacionality: 1,
            mothers_qualification: 1,
            fathers_qualification: 1,
            educational_special_needs: 0,
            debtor: 0,
            tuition_fees_up_to_date: 1,
            gender: 0,
            scholarship_holder: 0,
            age_at_enrollment: 18,
            international: 0,
            curricular_units_1st_sem_enrolled: 6,
            curricular_units_1st_sem_evaluations: 6,
            curricular_units_1st_sem_approved: 6,
            curricular_units_1st_sem_grade: 15.0,
            curricular_units_1st_sem_without_evaluations: 0,
            curricular_units_2nd_sem_enrolled: 6,
            curricular_units_2nd_sem_evaluations: 6,
            curricular_units_2nd_sem_approved: 5,
            curricular_units_2nd_sem_grade: 14.0,
            curricular_units_2nd_sem_without_evaluations: 0,
            unemployment_rate: 10.0,
            inflation_rate: 1.2,
            gdp: 2.1,
        }
    }
}

fn check_code(
    field: &'static str,
    value: u16,
    range: &RangeInclusive<u16>,
) -> Result<(), PredictError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(PredictError::OutOfDomain {
            field,
            message: format!(
                "{} is outside {}..={}",
                value,
                range.start(),
                range.end()
            ),
        })
    }
}

fn check_flag(field: &'static str, value: u8) -> Result<(), PredictError> {
    if value <= 1 {
        Ok(())
    } else {
        Err(PredictError::OutOfDomain {
            field,
            message: format!("{} is not a 0/1 flag", value),
        })
    }
}

fn check_grade(field: &'static str, value: f32) -> Result<(), PredictError> {
    if SEMESTER_GRADE.contains(&value) {
        Ok(())
    } else {
        Err(PredictError::OutOfDomain {
            field,
            message: format!(
                "{} is outside {:.1}..={:.1}",
                value,
                SEMESTER_GRADE.start(),
                SEMESTER_GRADE.end()
            ),
        })
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), PredictError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PredictError::OutOfDomain {
            field,
            message: "not a finite number".to_string(),
        })
    }
}

/// One complete record as the fitted preprocessor expects it: the 29
/// user-supplied fields plus the 7 fixed defaults. Built fresh per
/// submission, consumed once by inference, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(flatten)]
    pub form: StudentForm,
    #[serde(rename = "Mothers_occupation")]
    pub mothers_occupation: u16,
    #[serde(rename = "Fathers_occupation")]
    pub fathers_occupation: u16,
    #[serde(rename = "Curricular_units_1st_sem_credited")]
    pub curricular_units_1st_sem_credited: u16,
    #[serde(rename = "Curricular_units_2nd_sem_credited")]
    pub curricular_units_2nd_sem_credited: u16,
    #[serde(rename = "Displaced")]
    pub displaced: u8,
    #[serde(rename = "Previous_qualification_grade")]
    pub previous_qualification_grade: f32,
    #[serde(rename = "Admission_grade")]
    pub admission_grade: f32,
}

impl StudentRecord {
    /// Assemble a record from user input, injecting the fixed defaults for
    /// the fields the form does not expose.
    pub fn from_form(form: StudentForm) -> Self {
        Self {
            form,
            mothers_occupation: defaults::MOTHERS_OCCUPATION,
            fathers_occupation: defaults::FATHERS_OCCUPATION,
            curricular_units_1st_sem_credited: defaults::CREDITED_UNITS_1ST_SEM,
            curricular_units_2nd_sem_credited: defaults::CREDITED_UNITS_2ND_SEM,
            displaced: defaults::DISPLACED,
            previous_qualification_grade: defaults::PREVIOUS_QUALIFICATION_GRADE,
            admission_grade: defaults::ADMISSION_GRADE,
        }
    }

    /// The record as (column name, value) pairs for the transform hand-off.
    /// Order is stable but correctness only depends on the names.
    pub fn values(&self) -> Vec<(&'static str, f64)> {
        let f = &self.form;
        vec![
            ("Marital_status", f.marital_status as f64),
            ("Application_mode", f.application_mode as f64),
            ("Application_order", f.application_order as f64),
            ("Course", f.course as f64),
            (
                "Daytime_evening_attendance",
                f.daytime_evening_attendance as f64,
            ),
            ("Previous_qualification", f.previous_qualification as f64),
            ("Nacionality", f.nacionality as f64),
            ("Mothers_qualification", f.mothers_qualification as f64),
            ("Fathers_qualification", f.fathers_qualification as f64),
            (
                "Educational_special_needs",
                f.educational_special_needs as f64,
            ),
            ("Debtor", f.debtor as f64),
            ("Tuition_fees_up_to_date", f.tuition_fees_up_to_date as f64),
            ("Gender", f.gender as f64),
            ("Scholarship_holder", f.scholarship_holder as f64),
            ("Age_at_enrollment", f.age_at_enrollment as f64),
            ("International", f.international as f64),
            (
                "Curricular_units_1st_sem_enrolled",
                f.curricular_units_1st_sem_enrolled as f64,
            ),
            (
                "Curricular_units_1st_sem_evaluations",
                f.curricular_units_1st_sem_evaluations as f64,
            ),
            (
                "Curricular_units_1st_sem_approved",
                f.curricular_units_1st_sem_approved as f64,
            ),
            (
                "Curricular_units_1st_sem_grade",
                f.curricular_units_1st_sem_grade as f64,
            ),
            (
                "Curricular_units_1st_sem_without_evaluations",
                f.curricular_units_1st_sem_without_evaluations as f64,
            ),
            (
                "Curricular_units_2nd_sem_enrolled",
                f.curricular_units_2nd_sem_enrolled as f64,
            ),
            (
                "Curricular_units_2nd_sem_evaluations",
                f.curricular_units_2nd_sem_evaluations as f64,
            ),
            (
                "Curricular_units_2nd_sem_approved",
                f.curricular_units_2nd_sem_approved as f64,
            ),
            (
                "Curricular_units_2nd_sem_grade",
                f.curricular_units_2nd_sem_grade as f64,
            ),
            (
                "Curricular_units_2nd_sem_without_evaluations",
                f.curricular_units_2nd_sem_without_evaluations as f64,
            ),
            ("Unemployment_rate", f.unemployment_rate as f64),
            ("Inflation_rate", f.inflation_rate as f64),
            ("GDP", f.gdp as f64),
            ("Mothers_occupation", self.mothers_occupation as f64),
            ("Fathers_occupation", self.fathers_occupation as f64),
            (
                "Curricular_units_1st_sem_credited",
                self.curricular_units_1st_sem_credited as f64,
            ),
            (
                "Curricular_units_2nd_sem_credited",
                self.curricular_units_2nd_sem_credited as f64,
            ),
            ("Displaced", self.displaced as f64),
            (
                "Previous_qualification_grade",
                self.previous_qualification_grade as f64,
            ),
            ("Admission_grade", self.admission_grade as f64),
        ]
    }
}

/// Predicted class for a student record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Dropout,
    Graduate,
}

impl Outcome {
    /// Map a classifier label to its outcome; labels outside {0, 1} are
    /// malformed classifier output.
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Outcome::Dropout),
            1 => Some(Outcome::Graduate),
            _ => None,
        }
    }

    pub fn label(self) -> u8 {
        match self {
            Outcome::Dropout => 0,
            Outcome::Graduate => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Dropout => write!(f, "Dropout"),
            Outcome::Graduate => write!(f, "Graduate"),
        }
    }
}

/// Inference result: the predicted class and the probability mass the
/// classifier assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub outcome: Outcome,
    pub label: u8,
    pub confidence: f32,
    pub model_version: String,
    pub generated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> StudentForm {
        StudentForm::sample()
    }

    #[test]
    fn record_carries_all_36_fields() {
        let record = StudentRecord::from_form(sample_form());
        let values = record.values();
        assert_eq!(values.len(), 36);

        // every name unique
        let mut names: Vec<&str> = values.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 36);
    }

    #[test]
    fn defaults_injected_regardless_of_input() {
        let mut form = sample_form();
        form.course = 171;
        form.age_at_enrollment = 44;
        let record = StudentRecord::from_form(form);

        let values = record.values();
        let get = |name: &str| {
            values
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
                .unwrap()
        };
        assert_eq!(get("Mothers_occupation"), 0.0);
        assert_eq!(get("Fathers_occupation"), 0.0);
        assert_eq!(get("Curricular_units_1st_sem_credited"), 0.0);
        assert_eq!(get("Curricular_units_2nd_sem_credited"), 0.0);
        assert_eq!(get("Displaced"), 0.0);
        assert_eq!(get("Previous_qualification_grade"), 0.0);
        assert_eq!(get("Admission_grade"), 0.0);
    }

    #[test]
    fn grade_bounds_are_inclusive() {
        let mut form = sample_form();
        form.curricular_units_1st_sem_grade = 0.0;
        form.curricular_units_2nd_sem_grade = 20.0;
        assert!(form.validate().is_ok());

        form.curricular_units_2nd_sem_grade = 20.1;
        assert!(form.validate().is_err());
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let mut form = sample_form();
        form.age_at_enrollment = 15;
        assert!(form.validate().is_ok());
        form.age_at_enrollment = 80;
        assert!(form.validate().is_ok());

        form.age_at_enrollment = 14;
        assert!(form.validate().is_err());
        form.age_at_enrollment = 81;
        assert!(form.validate().is_err());
    }

    #[test]
    fn flags_reject_values_above_one() {
        let mut form = sample_form();
        form.debtor = 2;
        let err = form.validate().unwrap_err();
        assert!(err.to_string().contains("Debtor"));
    }

    #[test]
    fn marital_status_code_domain() {
        let mut form = sample_form();
        form.marital_status = 5;
        assert!(form.validate().is_ok());
        form.marital_status = 0;
        assert!(form.validate().is_err());
        form.marital_status = 6;
        assert!(form.validate().is_err());
    }

    #[test]
    fn macro_fields_reject_non_finite() {
        let mut form = sample_form();
        form.gdp = f32::NAN;
        assert!(form.validate().is_err());
        form.gdp = f32::INFINITY;
        assert!(form.validate().is_err());
    }

    #[test]
    fn serde_names_match_fitted_schema() {
        let record = StudentRecord::from_form(sample_form());
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 36);
        for (name, _) in record.values() {
            assert!(object.contains_key(name), "missing serde key {}", name);
        }
    }

    #[test]
    fn outcome_label_round_trip() {
        assert_eq!(Outcome::from_label(0), Some(Outcome::Dropout));
        assert_eq!(Outcome::from_label(1), Some(Outcome::Graduate));
        assert_eq!(Outcome::from_label(2), None);
        assert_eq!(Outcome::Graduate.label(), 1);
        assert_eq!(Outcome::Dropout.to_string(), "Dropout");
    }
}

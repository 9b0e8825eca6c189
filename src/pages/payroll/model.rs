use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ComputePayroll {
    pub(super) teacher_id: Uuid,
    pub(super) month: String,
    pub(super) total_sessions: i32,
    /// Defaults to the teacher directory's base salary when omitted.
    pub(super) base_salary: Option<i64>,
    pub(super) mode: CountMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ComputeAllPayrolls {
    pub(super) month: String,
    pub(super) total_sessions: i32,
    pub(super) mode: CountMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct PayPayroll {
    pub(super) amount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SavedPayroll {
    pub(super) id: Uuid,
    pub(super) record: PayrollDraft,
}

#[derive(Debug, Serialize)]
pub(super) struct TeacherPayrollOutcome {
    pub(super) teacher_id: Uuid,
    pub(super) username: String,
    pub(super) draft: Option<PayrollDraft>,
    pub(super) error: Option<String>,
}

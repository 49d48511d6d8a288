pub const PATIENTS: &str = "patients";
pub const APPOINTMENTS: &str = "appointments";
pub const PRESCRIPTIONS: &str = "prescriptions";
pub const BILLING: &str = "billing";
pub const QUEUE_TOKENS: &str = "queue_tokens";

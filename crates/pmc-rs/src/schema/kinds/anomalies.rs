// crates/pmc-rs/src/schema/kinds/anomalies.rs
//! Kinds of the anomaly tree.

use uuid::Uuid;

use crate::schema::kinds::PARAMETER_LIKE;
use crate::schema::meta;

choice_attr! {
    /// What the firmware does while an anomaly is active or inactive.
    pub enum ResponseLevel {
        #[default]
        Ignore = "ignore",
        Log = "log",
        Warning = "warning",
        Fault = "fault",
    }
}

impl ResponseLevel {
    pub fn description(self) -> &'static str {
        match self {
            ResponseLevel::Ignore => "No action is taken.",
            ResponseLevel::Log => "The anomaly is recorded in the event log.",
            ResponseLevel::Warning => "The anomaly is logged and reported as a warning.",
            ResponseLevel::Fault => "The anomaly is logged and the unit trips.",
        }
    }
}

choice_attr! {
    pub enum TriggerType {
        #[default]
        Edge = "edge",
        Level = "level",
        Latched = "latched",
    }
}

impl TriggerType {
    pub fn description(self) -> &'static str {
        match self {
            TriggerType::Edge => "Raised once when the condition starts.",
            TriggerType::Level => "Active for as long as the condition holds.",
            TriggerType::Latched => "Stays active until explicitly cleared.",
        }
    }
}

node_kind! {
    pub struct AnomaliesRoot {
        name: String => meta("Name"),
    }
}

node_kind! {
    pub struct AnomalyTable {
        name: String => meta("Name"),
        abbreviation: String => meta("Abbreviation"),
        code: i64 => meta("Code"),
    }
}

node_kind! {
    pub struct Anomaly {
        name: String => meta("Name"),
        abbreviation: Option<String> => meta("Abbreviation"),
        code: i64 => meta("Code"),
        description: Option<String> => meta("Description"),
        response_level_active: ResponseLevel => meta("Response Level Active"),
        response_level_inactive: ResponseLevel => meta("Response Level Inactive"),
        trigger_type: TriggerType => meta("Trigger Type"),
        comment: Option<String> => meta("Comment"),
    }
}

node_kind! {
    /// Parameter whose value feeds an anomaly's condition.
    pub struct AnomalySource {
        name: String => meta("Name"),
        parameter_uuid: Option<Uuid> => meta("Parameter").refs(PARAMETER_LIKE),
    }
}

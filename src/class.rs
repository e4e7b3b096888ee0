use serde::{Deserialize, Serialize};

/// Output persistence of a process. Cached and temp processes must be idempotent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Persistence {
    #[default]
    Raw,
    Cached,
    Temp,
}

/// How the execution layer should schedule data created by a process
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingClass {
    Interactive,
    #[default]
    Batch,
}

impl Persistence {
    /// db column value
    pub fn code(&self) -> &'static str {
        match self {
            Persistence::Raw => "RAW",
            Persistence::Cached => "CAC",
            Persistence::Temp => "TMP",
        }
    }

    pub fn from_code(code: &str) -> Option<Persistence> {
        match code {
            "RAW" => Some(Persistence::Raw),
            "CAC" => Some(Persistence::Cached),
            "TMP" => Some(Persistence::Temp),
            _ => None,
        }
    }
}

impl SchedulingClass {
    /// db column value
    pub fn code(&self) -> &'static str {
        match self {
            SchedulingClass::Interactive => "IN",
            SchedulingClass::Batch => "BA",
        }
    }

    pub fn from_code(code: &str) -> Option<SchedulingClass> {
        match code {
            "IN" => Some(SchedulingClass::Interactive),
            "BA" => Some(SchedulingClass::Batch),
            _ => None,
        }
    }
}

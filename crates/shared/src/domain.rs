use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(MachineTypeId);
id_newtype!(MachineId);
id_newtype!(ChecklistId);
id_newtype!(GroupId);
id_newtype!(ItemId);
id_newtype!(StateId);
id_newtype!(ReportId);

/// Outcome recorded for a single inspection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemResult {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
    #[serde(rename = "N/A")]
    NotApplicable,
    #[serde(rename = "PENDING")]
    Pending,
    #[default]
    #[serde(rename = "UNSET")]
    Unset,
}

impl ItemResult {
    pub const SELECTABLE: [ItemResult; 4] = [
        ItemResult::Ok,
        ItemResult::Nok,
        ItemResult::NotApplicable,
        ItemResult::Pending,
    ];

    pub fn is_set(self) -> bool {
        self != ItemResult::Unset
    }

    /// Only failures carry observations.
    pub fn keeps_notes(self) -> bool {
        self == ItemResult::Nok
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemResult::Ok => "OK",
            ItemResult::Nok => "NOK",
            ItemResult::NotApplicable => "N/A",
            ItemResult::Pending => "PENDING",
            ItemResult::Unset => "UNSET",
        }
    }
}

impl fmt::Display for ItemResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Traffic-light indicator derived from the results of a group's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Green,
    Red,
    Orange,
    Gray,
}

impl GroupStatus {
    pub fn badge(self) -> &'static str {
        match self {
            GroupStatus::Green => "[ OK ]",
            GroupStatus::Red => "[FAIL]",
            GroupStatus::Orange => "[WARN]",
            GroupStatus::Gray => "[ -- ]",
        }
    }

    pub fn has_problems(self) -> bool {
        matches!(self, GroupStatus::Red | GroupStatus::Orange)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineType {
    pub id: MachineTypeId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    #[serde(rename = "tipo_maquina_id")]
    pub machine_type_id: MachineTypeId,
    #[serde(rename = "cliente")]
    pub customer: String,
    #[serde(rename = "numero_bastidor", default)]
    pub chassis_number: Option<String>,
    #[serde(rename = "numero_flota", default)]
    pub fleet_number: Option<String>,
    #[serde(rename = "numero_horas", default)]
    pub hours: Option<f64>,
    #[serde(rename = "numero_matricula", default)]
    pub plate_number: Option<String>,
    #[serde(rename = "numero_kilometros", default)]
    pub kilometers: Option<f64>,
    #[serde(rename = "zona", default)]
    pub zone: Option<String>,
    #[serde(rename = "capacidad", default)]
    pub capacity: Option<String>,
    #[serde(rename = "numero_fabricacion", default)]
    pub serial_number: Option<String>,
}

impl Machine {
    pub fn display_name(&self) -> String {
        match self.chassis_number.as_deref().filter(|v| !v.is_empty()) {
            Some(chassis) => format!("{} ({chassis})", self.customer),
            None => self.customer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    #[serde(rename = "tipo_maquina_id")]
    pub machine_type_id: MachineTypeId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "activo", default)]
    pub active: bool,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_actualizacion", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistGroup {
    pub id: GroupId,
    pub checklist_id: ChecklistId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "orden", default)]
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    #[serde(rename = "grupo_id")]
    pub group_id: GroupId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "orden", default)]
    pub order: i32,
    #[serde(rename = "obligatorio", default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// A result value the backend accepts for one machine type, with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossibleState {
    pub id: StateId,
    #[serde(rename = "tipo_maquina_id")]
    pub machine_type_id: MachineTypeId,
    #[serde(rename = "nombre")]
    pub name: String,
}

use std::collections::HashMap;

use super::structs::ElsterType;

/// Positions of the program switch on the WPM/LWZ controllers.
pub const OPERATING_MODES: &[(u16, &str)] = &[
    (0, "Notbetrieb"),
    (1, "Bereitschaft"),
    (2, "Automatik"),
    (3, "Tagbetrieb"),
    (4, "Absenkbetrieb"),
    (5, "Warmwasser"),
];

/// One catalog entry: how to name and read a single Elster index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElsterEntry {
    pub index: u16,
    /// Name the bus documentation uses (German).
    pub name: &'static str,
    /// Topic-friendly english name; entries without one fall back to `name`.
    pub english: Option<&'static str>,
    pub kind: ElsterType,
}

impl ElsterEntry {
    pub fn display_name(&self) -> &'static str {
        self.english.unwrap_or(self.name)
    }
}

/* Excerpt of the community Elster index documentation, limited to the
 * indexes a WPM equipped heat pump actually cycles on the bus. */
const DEFAULT_ENTRIES: &[ElsterEntry] = &[
    ElsterEntry {
        index: 0x0001,
        name: "FEHLERMELDUNG",
        english: Some("error_message"),
        kind: ElsterType::Integer,
    },
    ElsterEntry {
        index: 0x0002,
        name: "KESSELSOLLTEMP",
        english: Some("boiler_setpoint_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0003,
        name: "SPEICHERSOLLTEMP",
        english: Some("dhw_setpoint_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0004,
        name: "VORLAUFSOLLTEMP",
        english: Some("flow_setpoint_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0005,
        name: "RAUMSOLLTEMP_I",
        english: Some("room_setpoint_temperature_1"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0006,
        name: "RAUMSOLLTEMP_II",
        english: Some("room_setpoint_temperature_2"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0007,
        name: "RAUMSOLLTEMP_III",
        english: Some("room_setpoint_temperature_3"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0008,
        name: "RAUMSOLLTEMP_NACHT",
        english: Some("room_setpoint_temperature_night"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x000C,
        name: "AUSSENTEMP",
        english: Some("outside_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x000D,
        name: "SPEICHERISTTEMP",
        english: Some("dhw_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x000E,
        name: "VORLAUFISTTEMP",
        english: Some("flow_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0010,
        name: "GERAETEKONFIGURATION",
        english: Some("device_configuration"),
        kind: ElsterType::Integer,
    },
    ElsterEntry {
        index: 0x0011,
        name: "RAUMISTTEMP",
        english: Some("room_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0012,
        name: "VERSTELLTE_RAUMSOLLTEMP",
        english: Some("adjusted_room_setpoint_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0013,
        name: "EINSTELL_SPEICHERSOLLTEMP",
        english: Some("dhw_setpoint_setting"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0014,
        name: "VERDAMPFERTEMP",
        english: Some("evaporator_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0016,
        name: "RUECKLAUFISTTEMP",
        english: Some("return_temperature"),
        kind: ElsterType::Decimal(10),
    },
    ElsterEntry {
        index: 0x0060,
        name: "HEIZKREISPUMPE",
        english: Some("heating_circuit_pump"),
        kind: ElsterType::Bool,
    },
    ElsterEntry {
        index: 0x0061,
        name: "SPEICHERLADEPUMPE",
        english: Some("dhw_charging_pump"),
        kind: ElsterType::Bool,
    },
    ElsterEntry {
        index: 0x0112,
        name: "PROGRAMMSCHALTER",
        english: Some("operating_mode"),
        kind: ElsterType::Enum(OPERATING_MODES),
    },
    ElsterEntry {
        index: 0x01D6,
        name: "WPVORLAUFIST",
        english: Some("heat_pump_flow_temperature"),
        kind: ElsterType::Decimal(10),
    },
];

/// Index catalog. Built once at startup and read-only afterwards, so lookups
/// are safe from any task.
#[derive(Debug, Clone)]
pub struct ElsterTable {
    entries: HashMap<u16, ElsterEntry>,
}

impl ElsterTable {
    /// The built-in catalog.
    pub fn new() -> ElsterTable {
        ElsterTable::from_entries(DEFAULT_ENTRIES)
    }

    /// Builds a catalog from an explicit entry list, e.g. one extended with
    /// site-specific indexes.
    pub fn from_entries(entries: &[ElsterEntry]) -> ElsterTable {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            map.insert(entry.index, *entry);
        }
        ElsterTable { entries: map }
    }

    /// An absent index is a skip case for the caller, never an error; the
    /// bus carries plenty of indexes nobody has documented yet.
    pub fn lookup(&self, index: u16) -> Option<&ElsterEntry> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ElsterTable {
    fn default() -> Self {
        ElsterTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_entries_have_unique_indexes() {
        let table = ElsterTable::new();
        assert_eq!(table.len(), DEFAULT_ENTRIES.len());
        assert!(!table.is_empty());
    }

    #[test]
    fn lookup_finds_known_indexes() {
        let table = ElsterTable::new();

        let entry = table.lookup(0x000C).unwrap();
        assert_eq!(entry.name, "AUSSENTEMP");
        assert_eq!(entry.display_name(), "outside_temperature");
        assert_eq!(entry.kind, ElsterType::Decimal(10));

        let entry = table.lookup(0x0112).unwrap();
        assert_eq!(entry.kind, ElsterType::Enum(OPERATING_MODES));
    }

    #[test]
    fn lookup_misses_return_none() {
        let table = ElsterTable::new();
        assert!(table.lookup(0xBEEF).is_none());
    }

    #[test]
    fn display_name_falls_back_to_the_wire_name() {
        let entry = ElsterEntry {
            index: 0x0ACD,
            name: "SOFTWARE_NUMMER",
            english: None,
            kind: ElsterType::Integer,
        };
        let table = ElsterTable::from_entries(&[entry]);
        assert_eq!(table.lookup(0x0ACD).unwrap().display_name(), "SOFTWARE_NUMMER");
    }
}

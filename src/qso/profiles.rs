//! Simulated station profiles the bot can operate as.

use serde::{Deserialize, Serialize};

use super::rng::RandomSource;

/// Operating style; selects the greeting pool used when acknowledging a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorStyle {
    Friendly,
    Formal,
    Casual,
    Enthusiastic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub rig: String,
    /// Output power in watts
    pub power: u32,
    pub antenna: String,
}

/// A station identity. Never mutated; a new one replaces it on reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub callsign: String,
    pub name: String,
    pub qth: String,
    pub country: String,
    pub equipment: Equipment,
    pub style: OperatorStyle,
}

impl Profile {
    fn station(
        callsign: &str,
        name: &str,
        qth: &str,
        country: &str,
        (rig, power, antenna): (&str, u32, &str),
        style: OperatorStyle,
    ) -> Self {
        Profile {
            callsign: callsign.to_string(),
            name: name.to_string(),
            qth: qth.to_string(),
            country: country.to_string(),
            equipment: Equipment {
                rig: rig.to_string(),
                power,
                antenna: antenna.to_string(),
            },
            style,
        }
    }
}

/// The built-in station catalog.
#[rustfmt::skip]
pub fn standard_profiles() -> Vec<Profile> {
    use OperatorStyle::*;
    vec![
        Profile::station("F4BOT", "JEAN", "PARIS", "FRANCE", ("ICOM IC-7300", 100, "DIPOLE"), Friendly),
        Profile::station("DL2CW", "HANS", "MUNICH", "GERMANY", ("YAESU FT-991A", 50, "VERTICAL"), Formal),
        Profile::station("G3TEST", "JOHN", "LONDON", "ENGLAND", ("ELECRAFT K3", 100, "BEAM"), Casual),
        Profile::station("EA5HAM", "CARLOS", "VALENCIA", "SPAIN", ("KENWOOD TS-590", 75, "VERTICAL GP"), Friendly),
        Profile::station("I2CW", "MARCO", "MILANO", "ITALY", ("FLEX 6600", 100, "HEXBEAM"), Enthusiastic),
        Profile::station("ON4NET", "PAUL", "BRUSSELS", "BELGIUM", ("ICOM IC-7610", 100, "COBWEB"), Casual),
        Profile::station("PA3CW", "WILLEM", "AMSTERDAM", "NETHERLANDS", ("YAESU FTDX10", 80, "LOOP"), Friendly),
        Profile::station("SM5ORM", "ERIK", "STOCKHOLM", "SWEDEN", ("KENWOOD TS-890", 100, "YAGI 3EL"), Formal),
    ]
}

/// Uniform pick from a catalog. The catalog must not be empty.
pub fn pick_profile(catalog: &[Profile], rng: &mut dyn RandomSource) -> Profile {
    let idx = rng.next_in_range(0, catalog.len());
    catalog[idx].clone()
}

/// Find a catalog entry by callsign (case-insensitive).
pub fn find_profile<'a>(catalog: &'a [Profile], callsign: &str) -> Option<&'a Profile> {
    let wanted = callsign.trim().to_ascii_uppercase();
    catalog.iter().find(|p| p.callsign == wanted)
}

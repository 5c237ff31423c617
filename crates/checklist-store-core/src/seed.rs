//! Initial content written when a store is found uninitialized, plus the
//! fixed facts about temperature units and checklist ordering.

use std::cmp::Ordering;

use crate::document::{Checklist, Document};

/// A refrigeration unit that must be logged on health checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureUnit {
    pub key: &'static str,
    pub name: &'static str,
    pub standard: &'static str,
    /// Highest compliant reading in °F.
    pub max_fahrenheit: f64,
}

const COOLER: &str = "41°F or below";
const FREEZER: &str = "0°F or below";

const fn cooler(key: &'static str, name: &'static str) -> TemperatureUnit {
    TemperatureUnit {
        key,
        name,
        standard: COOLER,
        max_fahrenheit: 41.0,
    }
}

const fn freezer(key: &'static str, name: &'static str) -> TemperatureUnit {
    TemperatureUnit {
        key,
        name,
        standard: FREEZER,
        max_fahrenheit: 0.0,
    }
}

pub const TEMPERATURE_UNITS: [TemperatureUnit; 11] = [
    cooler("Kitchen_Meat_Cooler", "Kitchen Meat Cooler"),
    freezer("Kitchen_Fry_Freezer", "Kitchen Fry Freezer"),
    cooler("Kitchen_Waffle_Cooler", "Kitchen Waffle Cooler"),
    cooler("Kitchen_Sandwich_Cooler", "Kitchen Sandwich Cooler"),
    cooler("Back_Meat_Cooler", "Back Storage Meat Cooler"),
    freezer("Back_Fry_Freezer", "Back Storage Fry Freezer"),
    cooler("Back_Produce_Cooler", "Back Storage Produce Cooler"),
    cooler("Front_Silver_Cooler", "Front Storage Silver Cooler"),
    cooler("Front_Drink_Cooler", "Front Storage Drink Cooler"),
    freezer("Front_Cheesecake_Freezer", "Front Storage Cheesecake Freezer"),
    cooler("Front_Counter_Drink_Cooler", "Front Counter Drink Cooler"),
];

pub fn temperature_unit(key: &str) -> Option<&'static TemperatureUnit> {
    TEMPERATURE_UNITS.iter().find(|u| u.key == key)
}

/// Task text for a unit's temperature log entry.
pub fn temperature_task(unit: &TemperatureUnit) -> String {
    format!(
        "[Temp Log] Record temperature for {} (Standard: {}).",
        unit.name, unit.standard
    )
}

/// Where completed-checklist notifications are addressed.
pub const MANAGER_EMAIL: &str = "manager@restaurant-app-alerts.com";

pub const HEALTH_CHECKLIST_ID: &str = "health";
pub const SUPERVISOR_AUDIT_ID: &str = "boh_supervisor_audit";

/// Checklists that cannot be deleted.
pub const STRUCTURAL_CHECKLIST_IDS: [&str; 2] = [HEALTH_CHECKLIST_ID, SUPERVISOR_AUDIT_ID];

pub fn is_structural(checklist_id: &str) -> bool {
    STRUCTURAL_CHECKLIST_IDS.contains(&checklist_id)
}

pub fn requires_temperature_log(checklist_id: &str) -> bool {
    checklist_id == HEALTH_CHECKLIST_ID
}

pub const DISPLAY_ORDER_IDS: [&str; 9] = [
    HEALTH_CHECKLIST_ID,
    "foh",
    "restroom",
    "fryer_station",
    "flattop_burner",
    "waffle_station",
    "expo_station_prep",
    "dish_station",
    SUPERVISOR_AUDIT_ID,
];

/// Checklists in display order: known ids first in fixed order, the rest
/// afterwards sorted by name.
pub fn display_order(checklists: &[Checklist]) -> Vec<&Checklist> {
    let rank = |id: &str| DISPLAY_ORDER_IDS.iter().position(|known| *known == id);
    let mut ordered: Vec<&Checklist> = checklists.iter().collect();
    ordered.sort_by(|a, b| match (rank(&a.id), rank(&b.id)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
    ordered
}

struct Station {
    id: &'static str,
    tag: &'static str,
    name: &'static str,
    tasks: &'static [&'static str],
}

const BOH_STATIONS: [Station; 5] = [
    Station {
        id: "fryer_station",
        tag: "Fryer",
        name: "1. Fryer Station (3 Fryers & Cold Prep)",
        tasks: &[
            "Drain, filter oil, and clean all 3 fryer pots/baskets.",
            "Clean and sanitize the adjacent prep table surface.",
            "Check meat cooler temperature (under 41°F).",
            "Ensure French fry freezer door is sealed and floor clear.",
            "Sweep/mop floor and clean surrounding walls around fryers and prep.",
        ],
    },
    Station {
        id: "flattop_burner",
        tag: "Flattop",
        name: "2. Flattop & 6-Eye Burner Station",
        tasks: &[
            "Scrape, scrub clean, and lightly oil the flattop.",
            "Remove grates from 6-eye burner, clean drip trays, and wipe exterior.",
            "Clean and sanitize the adjacent table and hot warmer well exterior.",
            "Verify hot warmer well water is clean and temperature is set (over 135°F).",
            "Clean surrounding walls and sweep/mop floor area.",
        ],
    },
    Station {
        id: "waffle_station",
        tag: "Waffle",
        name: "3. Waffle Maker Station",
        tasks: &[
            "Scrape off and wipe down 2 waffle makers (plates and exterior).",
            "Clean and sanitize the waffle batter prep surface.",
            "Check waffle maker cooler temperature (under 41°F).",
            "Restock waffle mix/ingredients as needed.",
            "Clean surrounding walls and sweep/mop floor area.",
        ],
    },
    Station {
        id: "expo_station_prep",
        tag: "Expo",
        name: "4. Expo & Sandwich Prep Station",
        tasks: &[
            "Clean and sanitize expo prep table surface.",
            "Wipe down POS/printer/monitor at expo station.",
            "Clean and organize double door sandwich cooler (exterior/interior).",
            "Check sandwich cooler temperature (under 41°F).",
            "Restock all side containers and condiments.",
            "Clean surrounding walls and sweep/mop floor area.",
        ],
    },
    Station {
        id: "dish_station",
        tag: "Dish",
        name: "5. Dish & Prep Sink Station",
        tasks: &[
            "Clean out the interior of the 3-compartment sink.",
            "Test and log sanitizer concentration in 3-comp sink.",
            "Clean and sanitize the dish rack area and wipe down dish machine exterior.",
            "Clean and sanitize the prep sink and two adjacent prep tables.",
            "Clean surrounding walls and sweep/squeegee water from floor near sinks.",
        ],
    },
];

fn checklist(id: &str, name: &str, tasks: Vec<String>) -> Checklist {
    Checklist {
        id: id.to_string(),
        name: name.to_string(),
        tasks,
        extra: Default::default(),
    }
}

fn owned(tasks: &[&str]) -> Vec<String> {
    tasks.iter().map(|t| t.to_string()).collect()
}

/// The checklists every new store starts with.
pub fn initial_checklists() -> Vec<Checklist> {
    let mut health = owned(&[
        "Verify all raw foods are stored below ready-to-eat foods.",
        "Test and log 3-compartment sink sanitizer concentration (e.g., 50-100 PPM).",
        "Ensure handwashing sinks are fully stocked and accessible.",
        "Confirm no bare-hand contact with ready-to-eat food (gloves/utensils used).",
        "Check and log internal cooking temperatures (Pork/Fish 145°F, Poultry 165°F).",
    ]);
    health.extend(TEMPERATURE_UNITS.iter().map(temperature_task));

    let mut lists = vec![
        checklist(HEALTH_CHECKLIST_ID, "Health Compliance", health),
        checklist(
            "foh",
            "FOH Opening Checklist",
            owned(&[
                "Turn on lights, set music/ambiance.",
                "Wipe down all tables, chairs, and booths.",
                "Spot clean all windows and glass doors (remove smudges).",
                "Fold and stock all napkins/silverware roll-ups.",
                "Stock server station and fill ice bins.",
                "Wipe down and sanitize all menus.",
                "Check FOH trash receptacles (empty and wipe exteriors).",
            ]),
        ),
        checklist(
            "restroom",
            "Restroom Cleanliness",
            owned(&[
                "Clean and sanitize toilet bowls and seats.",
                "Wipe down sinks, counters, and mirrors.",
                "Restock toilet paper and paper towels.",
                "Refill soap dispensers.",
                "Empty trash receptacle and replace liner.",
                "Spot mop floor and address any odors.",
            ]),
        ),
    ];

    lists.extend(
        BOH_STATIONS
            .iter()
            .map(|s| checklist(s.id, s.name, owned(s.tasks))),
    );

    let audit = BOH_STATIONS
        .iter()
        .flat_map(|s| s.tasks.iter().map(move |t| format!("[{}] {}", s.tag, t)))
        .collect();
    lists.push(checklist(
        SUPERVISOR_AUDIT_ID,
        "6. BOH Supervisor Audit (All Stations)",
        audit,
    ));

    lists
}

/// The document written when a store is found uninitialized.
pub fn initial_document() -> Document {
    Document {
        checklists: initial_checklists(),
        submissions: Vec::new(),
        reports: None,
        extra: Default::default(),
    }
}

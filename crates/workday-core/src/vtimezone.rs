use chrono_tz::Tz;

/// Zones on the EU rule: summer time from 01:00 UTC on the last Sunday of
/// March until 01:00 UTC on the last Sunday of October.
struct EuZoneFamily {
    standard_offset_hours: i32,
    standard_name: &'static str,
    daylight_name: &'static str,
    zones: &'static [&'static str],
}

const FAMILIES: [EuZoneFamily; 4] = [
    EuZoneFamily {
        standard_offset_hours: 1,
        standard_name: "CET",
        daylight_name: "CEST",
        zones: &[
            "Europe/Stockholm",
            "Europe/Oslo",
            "Europe/Copenhagen",
            "Europe/Berlin",
            "Europe/Paris",
            "Europe/Amsterdam",
            "Europe/Brussels",
            "Europe/Luxembourg",
            "Europe/Vienna",
            "Europe/Zurich",
            "Europe/Rome",
            "Europe/Madrid",
            "Europe/Prague",
            "Europe/Bratislava",
            "Europe/Warsaw",
            "Europe/Budapest",
            "Europe/Ljubljana",
            "Europe/Zagreb",
            "Europe/Belgrade",
            "Europe/Monaco",
            "Europe/Malta",
            "Europe/Andorra",
            "Arctic/Longyearbyen",
        ],
    },
    EuZoneFamily {
        standard_offset_hours: 2,
        standard_name: "EET",
        daylight_name: "EEST",
        zones: &[
            "Europe/Helsinki",
            "Europe/Mariehamn",
            "Europe/Tallinn",
            "Europe/Riga",
            "Europe/Vilnius",
            "Europe/Athens",
            "Europe/Sofia",
            "Europe/Bucharest",
        ],
    },
    EuZoneFamily {
        standard_offset_hours: 0,
        standard_name: "WET",
        daylight_name: "WEST",
        zones: &["Europe/Lisbon", "Atlantic/Canary", "Atlantic/Faroe", "Atlantic/Madeira"],
    },
    EuZoneFamily {
        standard_offset_hours: 0,
        standard_name: "GMT",
        daylight_name: "BST",
        zones: &[
            "Europe/London",
            "Europe/Jersey",
            "Europe/Guernsey",
            "Europe/Isle_of_Man",
        ],
    },
];

fn family_of(timezone: Tz) -> Option<&'static EuZoneFamily> {
    let name = timezone.name();
    FAMILIES.iter().find(|family| family.zones.contains(&name))
}

pub fn has_definition(timezone: Tz) -> bool {
    family_of(timezone).is_some()
}

/// Unfolded VTIMEZONE lines for `timezone`, or `None` when no embedded
/// definition is known and clients must resolve the TZID themselves.
pub fn definition(timezone: Tz) -> Option<Vec<String>> {
    let family = family_of(timezone)?;
    let standard = family.standard_offset_hours;
    let daylight = standard + 1;
    // Transitions happen at 01:00 UTC, expressed in the wall clock being left.
    let spring_hour = 1 + standard;
    let autumn_hour = 1 + daylight;

    Some(vec![
        "BEGIN:VTIMEZONE".to_string(),
        format!("TZID:{}", timezone.name()),
        "BEGIN:DAYLIGHT".to_string(),
        format!("TZOFFSETFROM:{}", format_offset(standard)),
        format!("TZOFFSETTO:{}", format_offset(daylight)),
        format!("TZNAME:{}", family.daylight_name),
        format!("DTSTART:19700329T{spring_hour:02}0000"),
        "RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU".to_string(),
        "END:DAYLIGHT".to_string(),
        "BEGIN:STANDARD".to_string(),
        format!("TZOFFSETFROM:{}", format_offset(daylight)),
        format!("TZOFFSETTO:{}", format_offset(standard)),
        format!("TZNAME:{}", family.standard_name),
        format!("DTSTART:19701025T{autumn_hour:02}0000"),
        "RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU".to_string(),
        "END:STANDARD".to_string(),
        "END:VTIMEZONE".to_string(),
    ])
}

fn format_offset(hours: i32) -> String {
    let sign = if hours < 0 { '-' } else { '+' };
    format!("{sign}{:02}00", hours.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stockholm_transitions_at_local_two_and_three() {
        let lines = definition(chrono_tz::Europe::Stockholm).unwrap();
        assert!(lines.contains(&"DTSTART:19700329T020000".to_string()));
        assert!(lines.contains(&"DTSTART:19701025T030000".to_string()));
        assert!(lines.contains(&"TZOFFSETTO:+0200".to_string()));
    }

    #[test]
    fn london_uses_gmt_offsets() {
        let lines = definition(chrono_tz::Europe::London).unwrap();
        assert!(lines.contains(&"TZOFFSETFROM:+0000".to_string()));
        assert!(lines.contains(&"DTSTART:19700329T010000".to_string()));
        assert!(lines.contains(&"TZNAME:BST".to_string()));
    }

    #[test]
    fn zones_without_eu_rule_have_no_definition() {
        assert!(definition(chrono_tz::America::New_York).is_none());
        assert!(!has_definition(chrono_tz::Asia::Tokyo));
    }
}

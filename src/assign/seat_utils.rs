use std::collections::{HashMap, HashSet};

use crate::history::SeatZone;

/// Parses a seat label ("7", " 12 ") to its number
pub fn parse_seat_number(label: &str) -> Option<u32> {
    label.trim().parse().ok()
}

pub fn is_even_seat(number: u32) -> bool {
    number % 2 == 0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub label: String,
    pub number: u32,
    pub zone: usize,
}

/// All seats of an assigner in display order, grouped into zones
#[derive(Debug, Clone)]
pub struct SeatLayout {
    pub zone_names: Vec<String>,
    pub seats: Vec<Seat>,
    // (zone, seat number) -> index into `seats`
    index: HashMap<(usize, u32), usize>,
}

impl SeatLayout {
    /// Builds the layout from the assigner's zones. Seat items that no zone
    /// claims go into an extra zone called `default_zone`, which is also the
    /// only zone when none are configured. Zone seats that are not among the
    /// items are ignored. Returns the offending label if a seat is not a number.
    pub fn build(items: &[String], zones: &[SeatZone], default_zone: &str) -> Result<Self, String> {
        let mut layout = SeatLayout {
            zone_names: Vec::new(),
            seats: Vec::new(),
            index: HashMap::new(),
        };
        let allowed = items
            .iter()
            .map(|label| parse_seat_number(label).ok_or_else(|| label.clone()))
            .collect::<Result<HashSet<u32>, String>>()?;
        let mut seen: HashSet<u32> = HashSet::new();

        for zone in zones {
            layout.push_zone(&zone.name, &zone.seats, &allowed, &mut seen)?;
        }
        let unzoned: Vec<String> = items
            .iter()
            .filter(|label| parse_seat_number(label).map(|n| !seen.contains(&n)).unwrap_or(false))
            .cloned()
            .collect();
        if !unzoned.is_empty() {
            layout.push_zone(default_zone, &unzoned, &allowed, &mut seen)?;
        }
        Ok(layout)
    }

    fn push_zone(
        &mut self,
        name: &str,
        labels: &[String],
        allowed: &HashSet<u32>,
        seen: &mut HashSet<u32>,
    ) -> Result<(), String> {
        let zone = self.zone_names.len();
        self.zone_names.push(name.to_string());
        for label in labels {
            let number = parse_seat_number(label).ok_or_else(|| label.clone())?;
            if !allowed.contains(&number) {
                continue;
            }
            // A seat number belongs to the first zone that lists it
            if !seen.insert(number) {
                continue;
            }
            self.index.insert((zone, number), self.seats.len());
            self.seats.push(Seat {
                label: label.trim().to_string(),
                number,
                zone,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seats numbered one below and one above, within the same zone
    pub fn neighbors(&self, seat: usize) -> Vec<usize> {
        let Seat { number, zone, .. } = self.seats[seat];
        let mut result = Vec::with_capacity(2);
        if let Some(below) = number.checked_sub(1) {
            if let Some(&idx) = self.index.get(&(zone, below)) {
                result.push(idx);
            }
        }
        if let Some(above) = number.checked_add(1) {
            if let Some(&idx) = self.index.get(&(zone, above)) {
                result.push(idx);
            }
        }
        result
    }
}

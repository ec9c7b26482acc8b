//! Text tables for the terminal.

use comfy_table::{Cell, Table};

use atc_core::{Catalogs, FlightSnapshot, Session};

/// Frame counters followed by the flight table.
pub fn print_summary(session: &Session) {
    let framer = session.framer_stats();
    let tracker = session.tracker();
    let stats = tracker.stats();

    println!();
    println!(
        "Frames: {} decoded, {} valid, {} invalid, {} malformed, {} bytes discarded",
        framer.frames_decoded,
        framer.frames_valid,
        framer.frames_invalid,
        framer.frames_malformed,
        framer.bytes_discarded
    );
    println!(
        "Flights: {} tracked, {} updates, {} teleports dropped, {} arrived",
        tracker.len(),
        stats.updated,
        stats.teleports_rejected,
        stats.arrivals
    );
    println!();

    if tracker.is_empty() {
        return;
    }
    println!("{}", flights_table(&tracker.snapshots()));
}

pub fn flights_table(snapshots: &[FlightSnapshot]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Flight", "Aircraft", "Class", "From", "To", "Lat", "Lon", "Alt", "Hdg", "Arrived",
        "Last seen", "Msgs",
    ]);

    for s in snapshots {
        table.add_row(vec![
            Cell::new(s.flight_id),
            Cell::new(s.aircraft_name.as_deref().unwrap_or("-")),
            Cell::new(s.aircraft_class.as_deref().unwrap_or("-")),
            Cell::new(s.src_airport_name.as_deref().unwrap_or("-")),
            Cell::new(s.dst_airport_name.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.4}", s.latitude)),
            Cell::new(format!("{:.4}", s.longitude)),
            Cell::new(s.altitude),
            Cell::new(format!("{:.1}", s.heading_deg)),
            Cell::new(if s.arrived { "yes" } else { "-" }),
            Cell::new(&s.last_seen),
            Cell::new(s.updates),
        ]);
    }
    table
}

pub fn aircraft_table(catalogs: &Catalogs) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Class", "Capacity", "Range (nm)"]);
    for (id, a) in catalogs.aircraft.sorted() {
        table.add_row(vec![
            Cell::new(format!("0x{id:02x}")),
            Cell::new(&a.name),
            Cell::new(&a.class),
            Cell::new(a.capacity),
            Cell::new(a.range_nm),
        ]);
    }
    table
}

pub fn airports_table(catalogs: &Catalogs) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Country", "Lat", "Lon"]);
    for (id, a) in catalogs.airports.sorted() {
        table.add_row(vec![
            Cell::new(format!("0x{id:02x}")),
            Cell::new(&a.name),
            Cell::new(&a.country),
            Cell::new(format!("{:.6}", a.latitude)),
            Cell::new(format!("{:.6}", a.longitude)),
        ]);
    }
    table
}

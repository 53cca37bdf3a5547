use chrono::{NaiveTime, TimeDelta};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{
        ordering::{StopOrder, Waypoint},
        plan::{Plan, PlanStop, StopKind, Summary},
        station::Availability,
    },
    quantity::percent::Percent,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn soc_cell(soc: Percent) -> Cell {
    let color = if soc < Percent::EMPTY {
        Color::Red
    } else if soc < Percent(20.0) {
        Color::DarkYellow
    } else {
        Color::Green
    };
    Cell::new(soc).set_alignment(CellAlignment::Right).fg(color)
}

pub fn build_plan_table(plan: &Plan) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Slot", "Stop", "Station", "Network", "Power", "Free", "Leg", "Arrive", "Depart", "Charge",
    ]);
    for stop in plan.stops() {
        table.add_row(build_stop_row(stop));
    }
    table
}

fn build_stop_row(stop: &PlanStop) -> Vec<Cell> {
    let slot = stop.slot.map_or_else(String::new, |slot| slot.to_string());
    let kind = match stop.kind {
        StopKind::Charger if stop.is_skipped => {
            Cell::new("Skipped").add_attribute(Attribute::CrossedOut)
        }
        StopKind::Charger => Cell::new(stop.kind),
        StopKind::Origin | StopKind::Destination => {
            Cell::new(stop.kind).add_attribute(Attribute::Bold)
        }
    };
    let (station, network, power, free) = match &stop.station {
        Some(station) => (
            Cell::new(format!("{} ({})", station.name, station.id)),
            Cell::new(&station.network),
            Cell::new(station.max_power).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}/{}", station.available_stalls, station.stall_count))
                .set_alignment(CellAlignment::Right)
                .fg(match station.availability() {
                    Availability::High => Color::Green,
                    Availability::Medium => Color::DarkYellow,
                    Availability::Low => Color::Red,
                }),
        ),
        None => (
            Cell::new(stop.location).add_attribute(Attribute::Dim),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
        ),
    };
    vec![
        Cell::new(slot).add_attribute(Attribute::Dim),
        kind,
        station,
        network,
        power,
        free,
        Cell::new(stop.leg_distance).set_alignment(CellAlignment::Right),
        soc_cell(stop.arrive_soc),
        soc_cell(stop.depart_soc),
        Cell::new(stop.charge_time).set_alignment(CellAlignment::Right),
    ]
}

pub fn build_summary_table(summary: &Summary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Drive", "Charge", "Total", "Charging stops"]);
    table.add_row(vec![
        Cell::new(summary.drive_time),
        Cell::new(summary.charge_time).fg(Color::Green),
        Cell::new(summary.total_time()).add_attribute(Attribute::Bold),
        Cell::new(summary.n_charging_stops),
    ]);
    table
}

pub fn build_order_table(waypoints: &[Waypoint], best: &StopOrder, depart_at: NaiveTime) -> Table {
    let clock = |minutes: f64| {
        #[expect(clippy::cast_possible_truncation)]
        let delta = TimeDelta::minutes(minutes.round() as i64);
        (depart_at + delta).format("%H:%M").to_string()
    };

    let mut table = new_table();
    table.set_header(vec!["#", "Waypoint", "Arrive", "Window", "Dwell"]);
    for (position, (index, arrival)) in best.order.iter().zip(&best.arrivals).enumerate() {
        let waypoint = &waypoints[*index];
        let window = waypoint.window.map_or_else(
            || Cell::new(""),
            |window| {
                let cell =
                    Cell::new(format!("{}–{}", clock(window.earliest.0), clock(window.latest.0)));
                if *arrival > window.latest { cell.fg(Color::Red) } else { cell.fg(Color::Green) }
            },
        );
        table.add_row(vec![
            Cell::new(position).add_attribute(Attribute::Dim),
            Cell::new(&waypoint.label),
            Cell::new(clock(arrival.0)),
            window,
            Cell::new(waypoint.dwell).set_alignment(CellAlignment::Right),
        ]);
    }

    let cost = &best.cost;
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(clock(best.duration().0)).add_attribute(Attribute::Bold),
        Cell::new(format!("{} tight, {} late", cost.n_tight_windows, cost.late)).fg(
            if cost.is_on_time() { Color::Green } else { Color::Red },
        ),
        Cell::new(format!("score {:.0}", cost.score())),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::ordering::{TimeWindow, TravelTimes, optimize},
        geo::Coordinates,
        quantity::{distance::Miles, time::Minutes},
    };

    #[test]
    fn plan_table_lists_every_stop() {
        let origin = PlanStop::origin(Coordinates::new(0.0, 0.0), Percent(10.0), Miles(50.0));
        let destination =
            PlanStop::destination(Coordinates::new(0.0, 1.0), Percent(-3.0), Miles(50.0));
        let plan = Plan::new(origin, Vec::new(), destination, Minutes(60.0));
        let table = build_plan_table(&plan);
        assert_eq!(table.row_iter().count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("Origin"));
        assert!(rendered.contains("-3.0 %"));
    }

    #[test]
    fn order_table_ok() {
        let waypoints = vec![
            Waypoint::builder().label("home").location(Coordinates::new(0.0, 0.0)).build(),
            Waypoint::builder()
                .label("office")
                .location(Coordinates::new(0.0, 0.1))
                .window(TimeWindow::new(Minutes(0.0), Minutes(60.0)).unwrap())
                .build(),
        ];
        let travel_times = TravelTimes::try_from(vec![
            vec![Minutes(0.0), Minutes(20.0)],
            vec![Minutes(20.0), Minutes(0.0)],
        ])
        .unwrap();
        let best = optimize(&waypoints, &travel_times).unwrap();
        let table = build_order_table(&waypoints, &best, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let rendered = table.to_string();
        assert!(rendered.contains("08:20"));
        assert!(rendered.contains("08:00–09:00"));
    }
}

//! Terminal output helpers

use owo_colors::OwoColorize;
use pulsepoint_geo::AnnotatedFacility;
use std::time::Duration;

/// Status message helpers
pub struct Status;

impl Status {
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Distances under a kilometer in meters, otherwise kilometers
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.2} km")
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{mins}m {remaining_secs:.0}s")
    }
}

pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// One numbered facility line, with address and contact underneath
pub fn print_facility(rank: usize, annotated: &AnnotatedFacility) {
    let facility = &annotated.facility;
    println!(
        "{:>3}. {:<40} {:>9}",
        rank,
        facility.name.bold(),
        format_distance(annotated.distance_km).cyan()
    );
    if let Some(address) = &facility.address {
        println!("     {}", address.dimmed());
    }
    if let Some(contact) = &facility.contact {
        println!("     {} {}", "☎".dimmed(), contact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.78), "780 m");
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(4.567), "4.57 km");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs_f32(12.34)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1, "facility", "facilities"), "1 facility");
        assert_eq!(format_count(3, "facility", "facilities"), "3 facilities");
    }
}

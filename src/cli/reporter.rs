// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::geometry::{AreaResult, Mesh};
use crate::io::{Coefficient, ForceCoefficients};
use crate::simulation::sweep::SweepDataset;
use crate::simulation::SimulationRequest;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    fn header(title: &str, subject: &str) {
        println!();
        Self::rule();
        println!("{} {}", title.bold(), subject.cyan());
        Self::rule();
    }

    /// Report point/cell counts and bounds of a mesh
    pub fn report_mesh(file: &str, mesh: &Mesh, duration: Duration) {
        Self::header("Mesh:", file);
        let bounds = mesh.bounds();
        Self::print_value("Points", &mesh.n_points().to_string());
        Self::print_value("Cells", &mesh.n_cells().to_string());
        Self::print_value(
            "Triangulated",
            if mesh.is_triangulated() { "yes" } else { "no" },
        );
        if !bounds.is_empty() {
            let size = bounds.size();
            Self::print_value(
                "Size",
                &format!("{:.4} x {:.4} x {:.4}", size.x, size.y, size.z),
            );
        }
        Self::print_value("Surface area", &format!("{:.4}", mesh.surface_area()));
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        Self::rule();
    }

    pub fn report_area(file: &str, area: &AreaResult, duration: Duration) {
        Self::header("Projected area:", file);
        Self::print_value("Reference", &area.reference.to_string());
        Self::print_value("Area", &format!("{:.6}", area.area));
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        Self::rule();
    }

    pub fn report_coefficients(source: &str, coefficients: &ForceCoefficients) {
        Self::header("Force coefficients:", source);
        for coefficient in Coefficient::ALL {
            let value = coefficients.get(coefficient);
            let formatted = format!("{:>10.4}", value);
            let colored_value = if value < 0.0 {
                formatted.yellow()
            } else {
                formatted.green()
            };
            println!(
                "  {} {}",
                format!("{:<12}", format!("{}:", coefficient)).bright_black(),
                colored_value
            );
        }
        Self::rule();
    }

    pub fn report_case(request: &SimulationRequest) {
        Self::header("Case:", &request.case_dir.display().to_string());
        Self::print_value("Object", &request.object_path.display().to_string());
        Self::print_value("Subdomains", &request.num_subdomains.to_string());
        Self::print_value(
            "Wind speed",
            &format!("{} m/s", request.settings.wind_speed_ms),
        );
        Self::print_value("Iterations", &request.settings.num_iterations.to_string());
        Self::rule();
    }

    pub fn report_sweep(dataset: &SweepDataset) {
        Self::header("Sweep:", &format!("{} angles", dataset.samples.len() + dataset.failures.len()));
        println!(
            "  {:>8} {:>10} {:>10} {:>10}",
            "AoA".bold(),
            "Drag".bold(),
            "Lift".bold(),
            "Moment".bold()
        );
        for sample in &dataset.samples {
            println!(
                "  {:>8.2} {:>10.4} {:>10.4} {:>10.4}",
                sample.angle_of_attack,
                sample.coefficients.drag,
                sample.coefficients.lift,
                sample.coefficients.moment
            );
        }
        for failure in &dataset.failures {
            println!(
                "  {:>8.2} {}",
                failure.angle_of_attack,
                format!("failed ({}): {}", failure.task_id, failure.reason).red()
            );
        }
        Self::rule();
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    fn print_value(name: &str, value: &str) {
        println!(
            "  {} {}",
            format!("{}:", name).bright_black(),
            value.cyan()
        );
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }
}

//! Output rendering and formatting

use banker_ops::OperationResult;
use banker_types::{
    ColorChoice, OutputFormat, SafetyReport, ScenarioReport, StateSnapshot, StepAction,
    StepOutcome, StepReport, StressReport, Units,
};
use comfy_table::{
    presets::{ASCII_FULL, UTF8_FULL},
    Attribute, Cell, Color, ContentArrangement, Table,
};
use console::{Style, Term};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Plain or terminal rendering when not in JSON mode
    format: OutputFormat,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, format: OutputFormat, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            format,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Whether styled output should be produced
    pub fn colors_enabled(&self) -> bool {
        if self.format == OutputFormat::Plain {
            return false;
        }
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::ScenarioReport(report) => self.render_scenario_report(report),
            OperationResult::SafetyReport(report) => self.render_safety_report(report),
            OperationResult::StressReport(report) => self.render_stress_report(report),
        }
    }

    fn render_scenario_report(&self, report: &ScenarioReport) -> io::Result<()> {
        println!("{}", self.bold(&format!("Scenario: {}", report.name)));
        println!();
        println!("Initial state:");
        self.render_state(&report.initial.state);
        println!("{}", self.safety_line(report.initial.safe, report_sequence(&report.initial)));

        for step in &report.steps {
            println!();
            println!("{}", self.step_line(step));
            self.render_state(&step.state);
        }

        let released = report
            .steps
            .iter()
            .filter(|step| step.outcome == StepOutcome::Released)
            .count();
        let denied = report
            .steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Denied { .. }))
            .count();
        println!();
        println!(
            "{} steps: {} granted, {} denied, {} released ({} ms)",
            report.steps.len(),
            report.granted(),
            denied,
            released,
            report.duration_ms
        );

        let holders: Vec<String> = report
            .final_state
            .holders()
            .iter()
            .map(ToString::to_string)
            .collect();
        if !holders.is_empty() {
            println!("Still holding resources: {}", holders.join(" "));
        }
        Ok(())
    }

    fn render_safety_report(&self, report: &SafetyReport) -> io::Result<()> {
        self.render_state(&report.state);
        println!("{}", self.safety_line(report.safe, report_sequence(report)));
        if !report.blocked.is_empty() {
            let blocked: Vec<String> = report.blocked.iter().map(ToString::to_string).collect();
            println!("Blocked: {}", blocked.join(" "));
        }
        Ok(())
    }

    fn render_stress_report(&self, report: &StressReport) -> io::Result<()> {
        let mut table = self.new_table();
        table.set_header(vec![
            self.header("Process"),
            self.header("Rounds"),
            self.header("Gave up"),
            self.header("Granted"),
            self.header("Over need"),
            self.header("Unavailable"),
            self.header("Deadlock risk"),
            self.header("Releases"),
        ]);

        for worker in &report.workers {
            table.add_row(vec![
                Cell::new(worker.process),
                Cell::new(worker.rounds_completed),
                Cell::new(worker.gave_up),
                Cell::new(worker.granted),
                Cell::new(worker.denied_exceeds_need),
                Cell::new(worker.denied_insufficient),
                Cell::new(worker.denied_deadlock_risk),
                Cell::new(worker.releases),
            ]);
        }

        println!("{table}");
        println!(
            "seed {}, {} rounds per worker: {} granted, {} denied, {} releases in {} ms",
            report.seed,
            report.rounds,
            report.total_granted(),
            report.total_denied(),
            report.total_releases(),
            report.duration_ms
        );
        println!("Available at end: {}", units(&report.final_state.available));

        let verdict = if report.invariants_held {
            self.paint(Style::new().green(), "Invariants held")
        } else {
            self.paint(Style::new().red().bold(), "Invariants BROKEN")
        };
        println!("{verdict}");
        Ok(())
    }

    /// Allocated/Max/Need table plus the free pool
    fn render_state(&self, state: &StateSnapshot) {
        let mut table = self.new_table();
        table.set_header(vec![
            self.header("Process"),
            self.header("Allocated"),
            self.header("Max"),
            self.header("Need"),
        ]);

        for i in 0..state.processes() {
            table.add_row(vec![
                Cell::new(format!("P{i}")),
                Cell::new(units(&state.allocated[i])),
                Cell::new(units(&state.max_need[i])),
                Cell::new(units(&state.need[i])),
            ]);
        }

        println!("{table}");
        println!(
            "Available: {}   Total: {}",
            units(&state.available),
            units(&state.total)
        );
    }

    fn step_line(&self, step: &StepReport) -> String {
        let verb = match step.action {
            StepAction::Request => "requests",
            StepAction::Release => "releases",
        };
        let outcome = match &step.outcome {
            StepOutcome::Granted { safe_sequence } => format!(
                "{} (safe sequence: {safe_sequence})",
                self.paint(Style::new().green(), "GRANTED")
            ),
            StepOutcome::Denied { reason } => {
                format!("{} ({reason})", self.paint(Style::new().yellow(), "DENIED"))
            }
            StepOutcome::Released => self.paint(Style::new().green(), "RELEASED"),
            StepOutcome::Rejected { message, .. } => {
                format!("{} ({message})", self.paint(Style::new().red(), "REJECTED"))
            }
        };
        format!(
            "Step {}: {} {verb} {} -> {outcome}",
            step.index,
            step.process,
            units(&step.amounts)
        )
    }

    fn safety_line(&self, safe: bool, sequence: Option<String>) -> String {
        if safe {
            format!(
                "{} (safe sequence: {})",
                self.paint(Style::new().green().bold(), "SAFE"),
                sequence.unwrap_or_default()
            )
        } else {
            self.paint(Style::new().red().bold(), "UNSAFE")
        }
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        let preset = if self.format == OutputFormat::Plain {
            ASCII_FULL
        } else {
            UTF8_FULL
        };
        table
            .load_preset(preset)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.colors_enabled() {
            table.force_no_tty();
        }
        table
    }

    fn header(&self, title: &str) -> Cell {
        let cell = Cell::new(title).add_attribute(Attribute::Bold);
        if self.colors_enabled() {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.colors_enabled() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

fn report_sequence(report: &SafetyReport) -> Option<String> {
    report.safe_sequence.as_ref().map(ToString::to_string)
}

/// `[0, 1, 0]` as `0 1 0`
fn units(values: &[Units]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

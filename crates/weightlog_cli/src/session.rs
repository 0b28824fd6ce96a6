//! Interactive menu session.
//!
//! # Responsibility
//! - Collect the start/goal setup on first run.
//! - Drive the record / analyze / exit menu until exit or end of input.
//!
//! # Invariants
//! - Every core failure is printed and control returns to the menu.
//! - Only I/O failures on the terminal itself end the session with an error.

use crate::chart::TextChart;
use chrono::NaiveDate;
use log::info;
use std::io::{self, BufRead, Write};
use weightlog_core::{
    format_user_date, parse_confirmation, parse_user_date, parse_weight, ProjectSetup,
    ProjectionError, ProjectionService, RecordOutcome, RecordService, RecordStore, TrendScope,
};

const MENU: &str = "\n1 - Record weight\n2 - Analyze progress\n3 - Exit";

pub struct Session<'a, R: BufRead, W: Write> {
    input: R,
    output: W,
    records: RecordService<&'a dyn RecordStore>,
    projection: ProjectionService<&'a dyn RecordStore>,
    chart: TextChart,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(input: R, output: W, store: &'a dyn RecordStore, scope: TrendScope) -> Self {
        Self {
            input,
            output,
            records: RecordService::new(store),
            projection: ProjectionService::with_scope(store, scope),
            chart: TextChart::default(),
        }
    }

    /// Runs setup (when needed) and the menu loop.
    pub fn run(&mut self) -> io::Result<()> {
        if self.records.needs_setup() {
            if !self.setup_project()? {
                return Ok(());
            }
        } else {
            writeln!(self.output, "Project file found. Let's keep tracking!")?;
            self.print_summary()?;
        }

        loop {
            writeln!(self.output, "{MENU}")?;
            let Some(choice) = self.prompt("Choose an option: ")? else {
                return Ok(());
            };
            match choice.trim() {
                "1" => self.record_weight()?,
                "2" => self.analyze_progress()?,
                "3" => {
                    writeln!(self.output, "Exiting... See you!")?;
                    info!("event=cli_exit module=cli status=ok");
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid option, try again.")?,
            }
        }
    }

    /// Returns `false` when input ended before a project was saved.
    fn setup_project(&mut self) -> io::Result<bool> {
        writeln!(self.output, "Welcome to weight tracking!")?;
        writeln!(self.output, "Let's set up your weight loss or gain project.")?;

        loop {
            let Some(start_date) = self.ask_date("Project start date (DD/MM/YYYY): ")? else {
                return Ok(false);
            };
            let Some(start_weight) = self.ask_weight("Starting weight (kg): ")? else {
                return Ok(false);
            };
            let end_date = loop {
                let Some(end_date) = self.ask_date("Project end date (DD/MM/YYYY): ")? else {
                    return Ok(false);
                };
                if end_date > start_date {
                    break end_date;
                }
                writeln!(
                    self.output,
                    "Error: the end date must be after the start date. Try again."
                )?;
            };
            let Some(goal_weight) = self.ask_weight("Goal weight at the end of the project (kg): ")?
            else {
                return Ok(false);
            };

            writeln!(self.output, "\nPlease confirm the project data:")?;
            writeln!(
                self.output,
                "Start date: {} | Starting weight: {start_weight}kg",
                format_user_date(start_date)
            )?;
            writeln!(
                self.output,
                "End date: {} | Goal weight: {goal_weight}kg",
                format_user_date(end_date)
            )?;
            let Some(answer) =
                self.prompt("Is this correct? Type 'S' to confirm or 'N' to start over: ")?
            else {
                return Ok(false);
            };
            if !parse_confirmation(&answer) {
                writeln!(self.output, "Setup cancelled. Please enter the data again.")?;
                continue;
            }

            let setup = ProjectSetup {
                start_date,
                start_weight,
                end_date,
                goal_weight,
            };
            match self.records.initialize_project(&setup) {
                Ok(_) => {
                    writeln!(self.output, "Project set up successfully!")?;
                    writeln!(self.output, "You can now start recording your weekly weights.")?;
                    return Ok(true);
                }
                Err(err) => writeln!(self.output, "Error: {err}")?,
            }
        }
    }

    fn record_weight(&mut self) -> io::Result<()> {
        let Some(raw_date) = self.prompt("Record date (DD/MM/YYYY): ")? else {
            return Ok(());
        };
        let Some(raw_weight) = self.prompt("Weight (kg): ")? else {
            return Ok(());
        };
        let weight = match parse_weight(&raw_weight) {
            Ok(weight) => weight,
            Err(err) => {
                writeln!(self.output, "Error: {err}")?;
                return Ok(());
            }
        };

        let Self {
            input,
            output,
            records,
            ..
        } = self;
        let mut prompt_error = None;
        let result = records.record_weight_input(&raw_date, weight, |existing, _| {
            match confirm_overwrite(input, output, existing.date, existing.weight) {
                Ok(confirmed) => confirmed,
                Err(err) => {
                    prompt_error = Some(err);
                    false
                }
            }
        });
        if let Some(err) = prompt_error {
            return Err(err);
        }

        match result {
            Ok(RecordOutcome::Inserted(record)) => writeln!(
                self.output,
                "Weight of {}kg recorded for {}!",
                record.weight,
                format_user_date(record.date)
            ),
            Ok(RecordOutcome::Updated {
                record,
                previous_weight,
            }) => writeln!(
                self.output,
                "Weight for {} updated to {}kg (was {previous_weight}kg).",
                format_user_date(record.date),
                record.weight
            ),
            Ok(RecordOutcome::DuplicateDeclined(_)) => {
                writeln!(self.output, "Operation cancelled. Nothing was changed.")
            }
            Err(err) => writeln!(self.output, "Error: {err}"),
        }
    }

    fn analyze_progress(&mut self) -> io::Result<()> {
        match self.projection.forecast() {
            Ok((project, forecast)) => {
                writeln!(self.output, "{}", forecast.headline())?;
                writeln!(self.output)?;
                self.chart
                    .render(&forecast.chart(&project), &mut self.output)
            }
            Err(ProjectionError::CorruptDates(rows)) => {
                writeln!(
                    self.output,
                    "Some dates in the history are invalid. Check and fix them manually!"
                )?;
                for row in rows {
                    writeln!(self.output, "  {row}")?;
                }
                Ok(())
            }
            Err(err) => writeln!(self.output, "Error: {err}"),
        }
    }

    fn print_summary(&mut self) -> io::Result<()> {
        match self.records.project_summary() {
            Ok(summary) => writeln!(
                self.output,
                "Goal: {}kg by {} | latest: {}kg on {} ({} measurement(s) recorded)",
                summary.goal.weight,
                format_user_date(summary.goal.date),
                summary.latest.weight,
                format_user_date(summary.latest.date),
                summary.intermediate_count
            ),
            Err(err) => writeln!(self.output, "Warning: {err}"),
        }
    }

    fn ask_date(&mut self, message: &str) -> io::Result<Option<NaiveDate>> {
        loop {
            let Some(raw) = self.prompt(message)? else {
                return Ok(None);
            };
            match parse_user_date(&raw) {
                Ok(date) => return Ok(Some(date)),
                Err(err) => writeln!(self.output, "Error: {err}")?,
            }
        }
    }

    fn ask_weight(&mut self, message: &str) -> io::Result<Option<f64>> {
        loop {
            let Some(raw) = self.prompt(message)? else {
                return Ok(None);
            };
            match parse_weight(&raw) {
                Ok(weight) => return Ok(Some(weight)),
                Err(err) => writeln!(self.output, "Error: {err}")?,
            }
        }
    }

    /// Returns `None` at end of input.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        read_answer(&mut self.input, &mut self.output, message)
    }
}

fn confirm_overwrite<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    date: NaiveDate,
    weight: f64,
) -> io::Result<bool> {
    writeln!(
        output,
        "The date {} is already recorded ({weight}kg).",
        format_user_date(date)
    )?;
    let answer = read_answer(
        input,
        output,
        "Update the weight for this date? Type 'S' for yes or 'N' for no: ",
    )?;
    Ok(answer.as_deref().is_some_and(parse_confirmation))
}

fn read_answer<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> io::Result<Option<String>> {
    write!(output, "{message}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

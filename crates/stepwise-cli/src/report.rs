use colored::Colorize;
use stepwise_runner::{Report, ReportEvent};

/// Verbose report printing colored progress lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport;

impl Report for ConsoleReport {
    fn event(&mut self, event: &ReportEvent<'_>, message: &str) {
        match event {
            ReportEvent::NothingToDo { .. } => println!("{}", message.bright_yellow()),
            ReportEvent::Started { .. } => {
                for line in message.lines() {
                    println!("{}", line.bright_cyan().bold());
                }
            }
            ReportEvent::UnitStarted { direction, .. } => {
                println!("  {} {}", direction.method().bright_blue(), message.bright_white());
            }
            ReportEvent::UnitFinished { from, to, .. } => {
                println!(
                    "    {} {} {}",
                    from.to_string().bright_magenta(),
                    "->".bright_white(),
                    to.to_string().bright_magenta()
                );
            }
            ReportEvent::Finished { .. } => println!("{}", message.bright_green().bold()),
        }
    }
}

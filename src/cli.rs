// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Analyze timetable generator log files", long_about = None)]
#[command(group = clap::ArgGroup::new("view").multiple(false))]
pub struct Args {
    /// Path to the log file
    pub logfile: PathBuf,

    /// Show only endpoint popularity
    #[arg(long, group = "view")]
    pub endpoints: bool,

    /// Show only performance metrics
    #[arg(long, group = "view")]
    pub performance: bool,

    /// Show only user statistics
    #[arg(long, group = "view")]
    pub users: bool,

    /// Show only timetable generation stats
    #[arg(long, group = "view")]
    pub timetables: bool,

    /// Show complete report (default)
    #[arg(long, group = "view")]
    pub all: bool,

    /// Do not draw the scan progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Which part of the report to print
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Endpoints,
    Performance,
    Users,
    Timetables,
    All,
}

impl Args {
    pub fn view(&self) -> View {
        if self.endpoints {
            View::Endpoints
        } else if self.performance {
            View::Performance
        } else if self.users {
            View::Users
        } else if self.timetables {
            View::Timetables
        } else {
            View::All
        }
    }
}

use crate::core::engine::Request;
use crate::domain::model::{PitcherParams, SeasonRange, TeamParams};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "pitcher-rating")]
#[command(about = "calculate pitcher ratings for MLB pitchers")]
#[command(version)]
pub struct Cli {
    /// Detailed logging to stdout and the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML settings file (default: ./pitcher-rating.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Always query the statistics provider, ignoring the response cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Log CPU and memory usage per phase
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct OutputArgs {
    /// Save the resulting data to a file
    #[arg(short, long)]
    pub output: bool,

    /// Save a chart of the resulting data
    #[arg(short, long)]
    pub chart: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Obtain pitcher ratings for all pitchers in the given season
    Pitchers {
        /// The year of the MLB season
        season: i32,

        /// Include every season up to and including this one
        #[arg(short, long)]
        through: Option<i32>,

        /// Minimum plate appearances (default: qualified pitchers only)
        #[arg(short = 'q', long = "min-pa")]
        min_pa: Option<u32>,

        /// Order the data from lowest to highest rating
        #[arg(short, long)]
        ascending: bool,

        /// The number of pitchers to include
        #[arg(short, long, default_value_t = PitcherParams::DEFAULT_LIMIT)]
        limit: usize,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Obtain pitcher ratings for all teams in the given season
    Teams {
        /// The year of the MLB season
        season: i32,

        /// Include every season up to and including this one
        #[arg(short, long)]
        through: Option<i32>,

        /// Order the data from lowest to highest rating
        #[arg(short, long)]
        ascending: bool,

        /// The number of teams to include
        #[arg(short, long, default_value_t = TeamParams::DEFAULT_LIMIT)]
        limit: usize,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Obtain league-average pitcher ratings in the given range of seasons
    Seasons {
        /// The first season to include
        start: i32,

        /// The last season to include
        end: i32,

        #[command(flatten)]
        output: OutputArgs,
    },
}

impl Command {
    pub fn into_request(self) -> Request {
        match self {
            Command::Pitchers {
                season,
                through,
                min_pa,
                ascending,
                limit,
                output,
            } => Request::Pitchers {
                params: PitcherParams {
                    season,
                    through,
                    min_qualifier: min_pa,
                    ascending,
                    limit,
                },
                save: output.output,
                chart: output.chart,
            },
            Command::Teams {
                season,
                through,
                ascending,
                limit,
                output,
            } => Request::Teams {
                params: TeamParams {
                    season,
                    through,
                    ascending,
                    limit,
                },
                save: output.output,
                chart: output.chart,
            },
            Command::Seasons { start, end, output } => Request::Seasons {
                range: SeasonRange { start, end },
                save: output.output,
                chart: output.chart,
            },
        }
    }
}

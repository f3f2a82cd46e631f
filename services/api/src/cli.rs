use crate::demo::{
    run_allocate, run_demo, run_import, run_score, AllocateArgs, DemoArgs, ImportArgs, ScoreArgs,
};
use crate::server;
use bay_street::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Bay Street",
    about = "Score hospitality deals and allocate a constrained portfolio from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single deal and print its Bay Score breakdown
    Score(ScoreArgs),
    /// Score a CSV batch of deals, optionally appending them to a deal store
    Import(ImportArgs),
    /// Allocate portfolio weights across a CSV batch or a stored universe
    Allocate(AllocateArgs),
    /// Walk through scoring, ranking and allocation on a sample deal deck
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Import(args) => run_import(args),
        Command::Allocate(args) => run_allocate(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bay_street::allocation::Objective;
    use bay_street::scoring::Region;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_score_flags_with_categories() {
        let cli = Cli::try_parse_from([
            "bay-street",
            "score",
            "--id",
            "Harbourfront",
            "--region",
            "apac",
            "--irr",
            "-2",
            "--coc-yield",
            "6",
            "--volatility",
            "10",
            "--lsd",
            "2",
            "--esg",
            "3",
            "--sponsor-coinvest",
            "5",
            "--op-lev",
        ])
        .expect("score arguments parse");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.region, Some(Region::Apac));
                assert_eq!(args.irr, -2.0);
                assert_eq!(args.illiquidity_premium, 2.0);
                assert!(args.op_lev);
                assert!(!args.brand_rep);
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }

    #[test]
    fn score_rejects_non_finite_numbers() {
        for value in ["NaN", "inf", "-infinity"] {
            let result = Cli::try_parse_from([
                "bay-street",
                "score",
                "--id",
                "Junk",
                "--irr",
                value,
                "--coc-yield",
                "6",
                "--volatility",
                "10",
                "--lsd",
                "2",
                "--esg",
                "3",
                "--sponsor-coinvest",
                "5",
            ]);
            assert!(result.is_err(), "{value} accepted");
        }
    }

    #[test]
    fn allocate_requires_a_single_source() {
        assert!(Cli::try_parse_from(["bay-street", "allocate"]).is_err());
        assert!(Cli::try_parse_from([
            "bay-street",
            "allocate",
            "--csv",
            "deals.csv",
            "--store",
            "universe.csv",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "bay-street",
            "allocate",
            "--store",
            "universe.csv",
            "--objective",
            "bay-score",
        ])
        .expect("allocate arguments parse");
        match cli.command {
            Some(Command::Allocate(args)) => {
                assert_eq!(args.objective, Some(Objective::BayScore));
                assert!(args.csv.is_none());
            }
            other => panic!("expected allocate command, got {other:?}"),
        }
    }

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["bay-street"]).expect("bare invocation parses");
        assert!(cli.command.is_none());
    }
}

//! CLI argument parsing for the courier-planner binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "courier-planner",
    about = "Delivery slot estimation and route planning for a single courier"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,
    /// Print the best delivery slots for a customer
    Predict {
        /// Customer name
        name: String,
        /// Target day, defaults to today
        #[arg(long)]
        day: Option<String>,
        /// Number of slots to return
        #[arg(long = "top")]
        top_k: Option<usize>,
    },
    /// Print the shortest route through the given customers (today's orders if none)
    Route {
        /// Customer names; repeat a name for extra parcels
        names: Vec<String>,
    },
    /// Print the pending orders
    Orders,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["courier-planner"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_serve_command_parses() {
        let cli = Cli::parse_from(["courier-planner", "serve"]);
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn test_cli_predict_command_parses() {
        let cli = Cli::parse_from(["courier-planner", "predict", "Meera", "--day", "Friday", "--top", "5"]);
        match cli.command {
            Some(Command::Predict { name, day, top_k }) => {
                assert_eq!(name, "Meera");
                assert_eq!(day.as_deref(), Some("Friday"));
                assert_eq!(top_k, Some(5));
            }
            _ => panic!("expected predict command"),
        }
    }

    #[test]
    fn test_cli_route_collects_names() {
        let cli = Cli::parse_from(["courier-planner", "route", "Aditya", "Meera", "Aditya"]);
        match cli.command {
            Some(Command::Route { names }) => assert_eq!(names, vec!["Aditya", "Meera", "Aditya"]),
            _ => panic!("expected route command"),
        }
    }

    #[test]
    fn test_cli_route_without_names() {
        let cli = Cli::parse_from(["courier-planner", "route"]);
        assert!(matches!(cli.command, Some(Command::Route { names }) if names.is_empty()));
    }

    #[test]
    fn test_cli_orders_command_parses() {
        let cli = Cli::parse_from(["courier-planner", "orders"]);
        assert!(matches!(cli.command, Some(Command::Orders)));
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::info;
use slicekeep_core::Aggregate;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an aggregate's membership and the group pools of its leaf switches
    Inspect {
        /// Aggregate description (JSON or Dhall)
        spec: PathBuf,
    },
    /// Replay a switch-event log against an aggregate and print the resulting switch states
    Replay {
        /// Aggregate description (JSON or Dhall)
        spec: PathBuf,

        /// Switch events (JSON)
        events: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Command::Inspect { spec } => {
            let aggregate = slicekeep_utils::read_aggregate(&spec)?;
            println!("{aggregate}");
            print_pools(&aggregate);
        }
        Command::Replay { spec, events } => {
            let aggregate = slicekeep_utils::read_aggregate(&spec)?;
            let events = slicekeep_utils::read_events(&events)?;
            let nr_events = events.len();
            let applied = events
                .iter()
                .filter(|event| slicekeep_utils::apply_event(&aggregate, event))
                .count();
            info!("applied {applied} of {nr_events} events to {}", aggregate.name());
            print_states(&aggregate);
            println!("ready: {}", aggregate.all_switches_connected());
        }
    }
    Ok(())
}

fn print_pools(aggregate: &Aggregate) {
    for node in aggregate.switches() {
        let groups = aggregate.peek_groups(&node).unwrap_or_default();
        println!("{node}: groups [{}]", groups.iter().join(", "));
    }
}

fn print_states(aggregate: &Aggregate) {
    for node in aggregate.tracked_switches() {
        if let Some(state) = aggregate.switch_state(node.dpid) {
            println!(
                "{node}: connected={} flushed={}",
                state.connected, state.flushed
            );
        }
    }
}

mod order;
mod plan;
mod services;
mod vehicle;

use clap::{Parser, Subcommand};

use crate::cli::{order::OrderArgs, plan::PlanArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan charging stops for a trip.
    #[clap(name = "plan")]
    Plan(Box<PlanArgs>),

    /// Find the best order to visit waypoints in.
    #[clap(name = "order")]
    Order(Box<OrderArgs>),
}

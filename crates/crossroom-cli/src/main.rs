//! Crossroom inspection binary.
//!
//! # Usage
//!
//! ```bash
//! # Would an online player be allowed to fill a cell in an active room?
//! crossroom check --action update_cell --role player --status active
//!
//! # Print the role x action table
//! crossroom matrix
//! ```

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use crossroom_core::{
    Action, PermissionContext, Role, RoomStatus, get_actions_for_role, get_minimum_role_for_action,
    validate_action_id,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crossroom permission inspector
#[derive(Parser, Debug)]
#[command(name = "crossroom")]
#[command(about = "Inspect crossword room permissions")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a single permission check
    Check(CheckArgs),

    /// Print which roles hold which actions
    Matrix,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Action identifier (e.g. `update_cell`)
    #[arg(short, long)]
    action: String,

    /// Participant role
    #[arg(short, long, default_value = "player")]
    role: Role,

    /// Room status
    #[arg(short, long, default_value = "active")]
    status: RoomStatus,

    /// Actor is the room's host
    #[arg(long)]
    host: bool,

    /// Actor has no live connection
    #[arg(long)]
    offline: bool,

    /// Room is private
    #[arg(long)]
    private: bool,

    /// Room is password-protected
    #[arg(long)]
    password: bool,

    /// Actor has a premium subscription
    #[arg(long)]
    premium: bool,
}

impl CheckArgs {
    fn context(&self) -> PermissionContext {
        PermissionContext {
            role: self.role,
            is_host: self.host,
            is_online: !self.offline,
            room_status: self.status,
            is_private: self.private,
            has_password: self.password,
            is_premium: self.premium,
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut out = io::stdout().lock();

    match args.command {
        Command::Check(check) => {
            let context = check.context();
            tracing::debug!("Checking {} with {:?}", check.action, context);

            match validate_action_id(&check.action, &context) {
                Ok(()) => {
                    writeln!(out, "allowed")?;
                    Ok(ExitCode::SUCCESS)
                },
                Err(reason) => {
                    writeln!(out, "denied: {reason}")?;
                    Ok(ExitCode::FAILURE)
                },
            }
        },
        Command::Matrix => {
            write_matrix(&mut out)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn write_matrix(out: &mut impl Write) -> io::Result<()> {
    let grants: Vec<_> = Role::ALL.iter().map(|role| (*role, get_actions_for_role(*role))).collect();

    write!(out, "{:<22}{:<11}", "action", "minimum")?;
    for (role, _) in &grants {
        write!(out, "{:<11}", role.as_str())?;
    }
    writeln!(out)?;

    for action in Action::ALL {
        let minimum = get_minimum_role_for_action(action).map_or("-", Role::as_str);
        write!(out, "{:<22}{:<11}", action.as_str(), minimum)?;
        for (_, actions) in &grants {
            let mark = if actions.contains(&action) { "x" } else { "." };
            write!(out, "{mark:<11}")?;
        }
        writeln!(out)?;
    }

    Ok(())
}

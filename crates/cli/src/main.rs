//! Shifter command line client.
//!
//! Runs one catalog operation against a scheduling server and prints the
//! result. Used for smoke testing a server without the desktop front end.

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use shifter_client::{ClientConfig, Shifter};
use tracing::info;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "shifter")]
#[command(about = "Shift-scheduling client")]
struct Args {
	/// TOML config file
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Server host, overrides config and SHIFTER_HOST
	#[arg(long)]
	host: Option<String>,

	/// Server port, overrides config and SHIFTER_PORT
	#[arg(long)]
	port: Option<u16>,

	/// Login id
	#[arg(short, long, env = "SHIFTER_USER")]
	user: Option<String>,

	/// Password
	#[arg(short, long, env = "SHIFTER_PASSWORD", hide_env_values = true)]
	password: Option<String>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Connect and disconnect
	Ping,
	/// Log in and print the session
	Login,
	/// Print the user's profile
	Info,
	/// Open an attendance record
	CheckIn,
	/// Close the attendance record opened by `check-in`
	CheckOut {
		/// Check-in id, defaults to the one just opened
		#[arg(long)]
		id: Option<i64>,
	},
	/// Attendance on a day
	Attendance {
		/// Day, defaults to today
		#[arg(long)]
		date: Option<NaiveDate>,
	},
	/// List team notices, or show one
	Notices {
		/// Notice id
		id: Option<i64>,
	},
	/// List handover notes, or show one
	Handovers {
		/// Handover id
		id: Option<i64>,
		/// Write the note's attachment here
		#[arg(long, value_name = "PATH", requires = "id")]
		save: Option<PathBuf>,
	},
	/// Monthly timetable
	Timetable {
		#[arg(long)]
		year: Option<i32>,
		#[arg(long)]
		month: Option<u32>,
	},
	/// Shift codes for the week starting at a day
	Week {
		/// Week start, defaults to today
		#[arg(long)]
		date: Option<NaiveDate>,
	},
	/// Team duty board
	Duty {
		#[arg(long)]
		date: Option<NaiveDate>,
	},
	/// Shift definitions
	Rules,
	/// Desired-shift requests for a month
	Requests {
		#[arg(long)]
		year: Option<i32>,
		#[arg(long)]
		month: Option<u32>,
	},
	/// Rewrite journal text on the server
	Summarize {
		text: String,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let mut config = ClientConfig::load(args.config.as_deref()).context("loading configuration")?;
	if let Some(host) = &args.host {
		config.host.clone_from(host);
	}
	if let Some(port) = args.port {
		config.port = port;
	}
	info!(addr = %config.addr(), "starting shifter");

	let shifter = Shifter::new(config);
	let result = tokio::select! {
		res = run(&shifter, &args) => res,
		_ = tokio::signal::ctrl_c() => {
			info!("interrupted");
			Ok(())
		}
	};
	shifter.shutdown().await;
	result
}

async fn run(shifter: &Shifter, args: &Args) -> anyhow::Result<()> {
	if let Command::Ping = args.command {
		shifter.transport().ensure_connected().await?;
		println!("connected to {}", shifter.transport().config().addr());
		return Ok(());
	}

	let (Some(user), Some(password)) = (&args.user, &args.password) else {
		bail!("--user and --password are required");
	};
	if !shifter.identity().login(user, password).await {
		bail!("login failed");
	}

	let today = Local::now().date_naive();
	match &args.command {
		Command::Ping => {}
		Command::Login => println!("{:#?}", shifter.session().snapshot()),
		Command::Info => match shifter.identity().user_info().await {
			Some(info) => println!("{info:#?}"),
			None => bail!("profile unavailable"),
		},
		Command::CheckIn => {
			if !shifter.attendance().check_in().await {
				bail!("check-in failed");
			}
			println!("check-in id {}", shifter.session().check_in_id());
		}
		Command::CheckOut { id } => {
			if let Some(id) = id {
				shifter.session().set_check_in_id(*id);
			}
			let ack = shifter.attendance().check_out().await;
			println!("{}: {}", if ack.ok { "ok" } else { "failed" }, ack.message.unwrap_or_default());
		}
		Command::Attendance { date } => {
			let record = shifter.attendance().attendance_on(date.unwrap_or(today)).await;
			println!("{record:#?}");
		}
		Command::Notices { id: None } => {
			for notice in shifter.notices().list().await {
				println!("{:>6}  {}  {}  {}", notice.notice_uid, notice.notice_date, notice.staff_name, notice.title);
			}
		}
		Command::Notices { id: Some(id) } => {
			let notice = shifter.notices().detail(*id).await.context("notice unavailable")?;
			println!("{}\n{} {}\n\n{}", notice.title, notice.notice_date, notice.staff_name, notice.content);
		}
		Command::Handovers { id: None, .. } => {
			for note in shifter.handover().list().await {
				println!(
					"{:>6}  {}  {}  {:<8}  {}  {}",
					note.handover_uid, note.date, note.shift, note.note_type, note.staff_name, note.title
				);
			}
		}
		Command::Handovers { id: Some(id), save } => {
			let note = shifter.handover().detail(*id).await.context("handover unavailable")?;
			println!("{note:#?}");
			if let Some(path) = save {
				if note.attachment.is_empty() {
					bail!("handover {id} has no attachment");
				}
				tokio::fs::write(path, &note.attachment)
					.await
					.with_context(|| format!("writing {}", path.display()))?;
			}
		}
		Command::Timetable { year, month } => {
			let (year, month) = (year.unwrap_or(today.year()), month.unwrap_or(today.month()));
			for entry in shifter.timetable().month(year, month).await {
				println!("{}  {}  {}h", entry.date, entry.shift, entry.hours);
			}
		}
		Command::Week { date } => {
			let codes = shifter.timetable().weekly(date.unwrap_or(today)).await;
			println!("{}", codes.join(" "));
		}
		Command::Duty { date } => {
			for group in shifter.timetable().today_duty(date.unwrap_or(today)).await {
				println!("{}: {}", group.shift, group.staff.join(", "));
			}
		}
		Command::Rules => {
			for rule in shifter.timetable().shift_rules().await {
				println!("{}  {}-{}  {}h", rule.duty_type, rule.start, rule.end, rule.hours);
			}
		}
		Command::Requests { year, month } => {
			let (year, month) = (year.unwrap_or(today.year()), month.unwrap_or(today.month()));
			for request in shifter.work_requests().month_requests(year, month).await {
				println!(
					"{}  {}  {:?}  {}",
					request.request_date, request.shift, request.status, request.reason
				);
			}
		}
		Command::Summarize { text } => match shifter.handover().summarize(text).await {
			Some(summary) => println!("{summary}"),
			None => bail!("summary unavailable"),
		},
	}

	shifter.identity().logout().await;
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let default_filter = if verbose {
		"shifter_client=debug,shifter_proto=trace,info"
	} else {
		"warn"
	};

	// SHIFTER_LOG_DIR sends logs to a per-process file instead of stderr
	if let Some(log_dir) = std::env::var("SHIFTER_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("shifter.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry().with(filter).with(file_layer).init();
			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
		.with_writer(std::io::stderr)
		.init();
}

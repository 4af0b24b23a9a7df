use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use yshop_orders::batch::FaultPolicy;
use yshop_orders::config::{parse_schedule_time, Config, ConfigError};
use yshop_orders::date_range::{DateRange, ORDER_TIME_ZONE};
use yshop_orders::order_processor::OrderProcessor;

#[derive(Parser)]
#[command(name = "yshop-orders")]
#[command(about = "Copy Yahoo!ショッピング order emails from Gmail into a Google spreadsheet")]
#[command(version = "0.1.0")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// First day to collect (YYYY/MM/DD), overrides the configuration
    #[arg(long)]
    start_date: Option<String>,

    /// Day after the last one to collect (YYYY/MM/DD), overrides the configuration
    #[arg(long)]
    end_date: Option<String>,

    /// Parse and print the orders without writing the sheet or marking emails read
    #[arg(short, long)]
    dry_run: bool,

    /// Skip emails that fail to parse instead of aborting the run
    #[arg(long)]
    skip_faulty: bool,

    /// Run at the configured schedule times, each run covering the previous day
    #[arg(long)]
    daemon: bool,

    /// Validate the configuration without connecting
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ConfigError>() {
                Some(ConfigError::Missing(detail)) => {
                    error!("❌ Missing configuration: {}", detail);
                    eprintln!("Error: missing configuration ({}).", detail);
                }
                Some(ConfigError::Malformed(detail)) => {
                    error!("❌ Malformed configuration: {}", detail);
                    eprintln!("Error: malformed configuration ({}).", detail);
                }
                None => {
                    error!("❌ Unexpected error: {:#}", e);
                    eprintln!("An unexpected error occurred: {:#}", e);
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    if let Some(start) = &args.start_date {
        config.start_date = start.clone();
    }
    if let Some(end) = &args.end_date {
        config.end_date = end.clone();
    }
    if args.daemon {
        config.validate_for_daemon()?;
    } else {
        config.validate()?;
    }

    if args.check_config {
        println!("✅ Configuration valid!");
        if !args.daemon {
            println!("📅 Range: {}", config.date_range()?);
        }
        println!("📊 Spreadsheet: {} / {}", config.spreadsheet_id, config.sheet_name);
        println!("🔑 Credentials: {}", config.credentials_path);
        println!("💾 Token cache: {}", config.token_cache_path);
        if !config.schedule_times.is_empty() {
            println!("⏰ Schedule: {:?}", config.schedule_times);
        }
        return Ok(());
    }

    let policy = if args.skip_faulty {
        FaultPolicy::SkipMessage
    } else {
        FaultPolicy::Abort
    };

    if args.daemon {
        info!("🔄 Starting in daemon mode");
        return run_daemon_mode(config, policy, args.dry_run).await;
    }

    let range = config.date_range()?;
    let processor = OrderProcessor::new(config, policy);

    let batch = if args.dry_run {
        processor.process_dry_run(&range).await?
    } else {
        processor.process(&range).await?
    };

    info!("✅ Done: {} order(s) processed", batch.len());
    Ok(())
}

async fn run_daemon_mode(config: Config, policy: FaultPolicy, dry_run: bool) -> Result<()> {
    use tokio_cron_scheduler::{Job, JobScheduler};

    let scheduler = JobScheduler::new().await?;

    for schedule_time in &config.schedule_times {
        let (hour, minute) = parse_schedule_time(schedule_time)?;

        // Format cron: "sec min hour * * *" (every day)
        let cron_expr = format!("0 {} {} * * *", minute, hour);
        info!("📆 Adding scheduled job: {} (cron: {})", schedule_time, cron_expr);

        let config = config.clone();
        let schedule_time = schedule_time.clone();

        let job = Job::new_async_tz(cron_expr.as_str(), ORDER_TIME_ZONE, move |_uuid, _l| {
            let config = config.clone();
            let schedule_time = schedule_time.clone();

            Box::pin(async move {
                let range = DateRange::previous_day(chrono::Utc::now());
                info!("⏰ Scheduled run at {} for {}", schedule_time, range);

                let processor = OrderProcessor::new(config, policy);
                let result = if dry_run {
                    processor.process_dry_run(&range).await
                } else {
                    processor.process(&range).await
                };

                match result {
                    Ok(batch) => info!("✅ Scheduled run at {} done: {} order(s)", schedule_time, batch.len()),
                    Err(e) => error!("❌ Scheduled run at {} failed: {:#}", schedule_time, e),
                }
            })
        })?;

        scheduler.add(job).await?;
    }

    scheduler.start().await?;

    info!("✅ Daemon started, waiting for {:?}", config.schedule_times);
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}

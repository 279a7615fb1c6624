//! open-data-export - writes pending location/day measurement files.

use chrono::NaiveDate;
use clap::Parser;
use log::{error, info};
use std::io::Write;
use std::process::ExitCode;

use open_data_export::config::Settings;
use open_data_export::database;
use open_data_export::domains::export::{ExportJob, ExportService, ExportWriter};
use open_data_export::domains::storage;
use open_data_export::errors::ServiceResult;

#[derive(Parser, Debug, Clone)]
#[command(name = "open-data-export")]
#[command(about = "Export location/day measurement files to local disk or S3")]
struct CliArgs {
    /// Day to export (YYYY-MM-DD); needs --node
    #[arg(long, requires = "node")]
    day: Option<NaiveDate>,

    /// Location id to export; needs --day
    #[arg(long, requires = "day")]
    node: Option<i64>,

    /// Queue every location/day again before running the batch
    #[arg(long, conflicts_with_all = ["day", "node", "list_days"])]
    reset: bool,

    /// Print location/days with their measurement counts and exit
    #[arg(long, conflicts_with_all = ["day", "node"])]
    list_days: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(level: &str) {
    let _ = env_logger::Builder::new()
        .parse_filters(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} [{}:{}] {}",
                buf.timestamp(),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();
}

async fn run(args: CliArgs) -> ServiceResult<()> {
    let settings = Settings::from_env()?;
    setup_logging(&settings.log_level);

    let repo = database::connect(&settings.database_url).await?;
    let storage = storage::from_destination(&settings.destination).await;
    info!(
        "writing {} files to {}",
        settings.write_file_format,
        storage.describe("")
    );

    let writer = ExportWriter::new(settings.write_file_format, storage);
    let service = ExportService::new(repo, writer, settings.limit).with_job_timeout(settings.job_timeout);

    if args.list_days {
        let days = service.location_days().await?;
        println!("{}", serde_json::to_string(&days)?);
        return Ok(());
    }

    if let (Some(day), Some(node)) = (args.day, args.node) {
        // A failed single export has already been logged; the run itself still succeeds.
        if let Ok(file) = service.export_data(ExportJob::new(node, day)).await {
            println!("{}", serde_json::to_string(&file)?);
        }
        return Ok(());
    }

    let jobs = if args.reset {
        service.export_all().await?
    } else {
        service.export_pending().await?
    };
    println!("{}", serde_json::to_string(&jobs)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_day_and_node_go_together() {
        let args = CliArgs::try_parse_from(["open-data-export", "--day", "2021-08-08", "--node", "7"]).unwrap();
        assert_eq!(args.day, NaiveDate::from_ymd_opt(2021, 8, 8));
        assert_eq!(args.node, Some(7));

        assert!(CliArgs::try_parse_from(["open-data-export", "--day", "2021-08-08"]).is_err());
        assert!(CliArgs::try_parse_from(["open-data-export", "--node", "7"]).is_err());
        assert!(CliArgs::try_parse_from(["open-data-export", "--day", "08/08/2021", "--node", "7"]).is_err());
    }

    #[test]
    fn test_batch_flags() {
        let args = CliArgs::try_parse_from(["open-data-export"]).unwrap();
        assert!(!args.reset && !args.list_days && args.day.is_none());

        assert!(CliArgs::try_parse_from(["open-data-export", "--reset"]).unwrap().reset);
        assert!(CliArgs::try_parse_from(["open-data-export", "--reset", "--list-days"]).is_err());
    }
}

use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::adapters::aws::cloudtrail_source::CloudTrailSource;
use crate::adapters::aws::session::AwsSession;
use crate::adapters::sink::file_event_sink::FileEventSink;
use crate::cli::console::ConsoleReporter;
use crate::cli::output;
use crate::cli::{Cli, ScanArgs};
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::filter_criteria::FilterCriteria;
use crate::core::models::run_summary::RunSummary;
use crate::core::models::service_profile::{ExportFormat, ServiceProfile};
use crate::core::models::time_window::TimeSpec;
use crate::core::services::monitor_service::MonitorService;
use crate::core::services::time_range::TimeRangeResolver;
use crate::core::traits::event_sink::EventSink;

/// Execute `trailwatch kms` / `trailwatch s3`.
///
/// Arguments are validated before any AWS call, so a bad range or an
/// empty filter set fails without touching credentials.
pub fn execute(
    cli: &Cli,
    service: ServiceProfile,
    identifier: Option<&str>,
    args: &ScanArgs,
) -> Result<RunSummary> {
    let config = AppConfig::load(cli.config.as_deref())?;

    let time = TimeSpec {
        last_n: args.last_n.clone(),
        start: args.start.clone(),
        end: args.end.clone(),
    };
    let window = TimeRangeResolver.resolve(&time)?;

    let criteria = FilterCriteria::new(
        identifier,
        args.event.as_deref(),
        args.user.as_deref(),
        args.operation.as_deref(),
        args.errors_only,
        args.success_only,
        args.all,
    )?;

    let profile = config.profile(cli.profile.as_deref());
    let region = config.region(cli.region.as_deref());
    let output_dir = config.output_dir(cli.output.as_deref())?;
    let format = config.export_format(args.export_format.map(ExportFormat::from));
    debug!(%profile, %region, output_dir = %output_dir.display(), %format, "resolved settings");

    let session = authenticate(&profile, &region, cli.quiet)?;

    let sink = FileEventSink::new(&output_dir, service.tag, args.export_file.as_deref(), format)?;
    let reporter = ConsoleReporter::new(
        service,
        sink.current_destination(),
        sink.is_custom().then_some(format),
        cli.quiet,
    );

    let cancel = CancellationToken::new();
    watch_ctrl_c(&session, cancel.clone());

    let source = CloudTrailSource::new(&session, cancel.clone());
    MonitorService::new(service, &sink, &reporter, cancel).run(&source, &window, &criteria)
}

fn authenticate(profile: &str, region: &str, quiet: bool) -> Result<AwsSession> {
    if quiet {
        return AwsSession::resolve(profile, region);
    }

    let sp = output::spinner(&format!("Authenticating with AWS profile '{profile}'..."));
    let session = match AwsSession::resolve(profile, region) {
        Ok(session) => session,
        Err(e) => {
            sp.finish_and_clear();
            return Err(e);
        }
    };
    output::finish_spinner(sp, "AWS authentication successful");

    let identity = &session.identity;
    println!("  Account: {}", identity.account.cyan());
    println!("  User ID: {}", identity.user_id.cyan());
    println!("  ARN: {}", identity.arn.cyan());
    println!("  Using Profile: {}", profile.cyan());
    println!("  Region: {}", region.cyan());
    Ok(session)
}

/// Cancel `token` on the first Ctrl-C.
fn watch_ctrl_c(session: &AwsSession, token: CancellationToken) {
    session.runtime().spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received");
            token.cancel();
        }
    });
}

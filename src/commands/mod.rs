pub mod aggregate;
pub mod enrich;
pub mod normalize;
pub mod run;
pub mod status;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::cli::StageArgs;
use crate::model::{RunReport, StageStats};
use crate::store;
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub(crate) fn render_command(stage: &str, args: &StageArgs) -> String {
    let mut command = vec![
        "crickpipe".to_string(),
        stage.to_string(),
        "--data-root".to_string(),
        args.data_root.display().to_string(),
    ];

    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(match_id) = args.match_id {
        command.push("--match-id".to_string());
        command.push(match_id.to_string());
    }
    if let Some(path) = &args.report_path {
        command.push("--report-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}

pub(crate) fn write_run_report(
    stage: &str,
    args: &StageArgs,
    started: DateTime<Utc>,
    started_at: String,
    stats: StageStats,
) -> Result<()> {
    let run_id = format!("run-{}", utc_compact_string(started));
    let counts = stats.counts();
    let status = if counts.matches_failed > 0 {
        "completed_with_failures"
    } else {
        "completed"
    };

    let report = RunReport {
        manifest_version: 1,
        run_id: run_id.clone(),
        db_schema_version: store::DB_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        command: render_command(stage, args),
        started_at,
        finished_at: now_utc_string(),
        counts,
        matches: stats.outcomes,
        warnings: stats.warnings,
    };

    let report_path = args.report_path.clone().unwrap_or_else(|| {
        args.data_root
            .join("reports")
            .join(format!("{stage}_{run_id}.json"))
    });
    write_json_pretty(&report_path, &report)?;

    info!(path = %report_path.display(), "wrote run report");
    info!(
        stage,
        succeeded = counts.matches_succeeded,
        skipped = counts.matches_skipped,
        failed = counts.matches_failed,
        warnings = report.warnings.len(),
        "stage completed"
    );

    Ok(())
}

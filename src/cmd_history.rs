//! `history` and `limits` subcommand handlers.

use anyhow::bail;
use tracing::{info, warn};

use leadflow_config::{Config, ConfigValidator, RateLimitConfig, RuntimeOptions};
use leadflow_history::HistoryStats;
use leadflow_store::save_rate_limit_config;

use crate::App;
use crate::cli::{HistoryAction, LimitsAction};

/// Handle history subcommands.
pub(crate) async fn handle_history_command(app: &App, action: HistoryAction) -> anyhow::Result<()> {
    match action {
        HistoryAction::Stats { format } => history_stats(app, &format).await,
        HistoryAction::Show { scope, limit } => history_show(app, &scope, limit).await,
        HistoryAction::Reset { scope } => {
            app.history.reset_scope(&scope).await?;
            println!("Reset history for scope '{}'", scope);
            Ok(())
        }
        HistoryAction::ResetAll { yes } => {
            if !yes {
                bail!("Refusing to clear all history without --yes");
            }
            app.history.reset_all().await?;
            println!("Cleared all interaction history");
            Ok(())
        }
    }
}

async fn history_stats(app: &App, format: &str) -> anyhow::Result<()> {
    let stats = app.history.get_stats().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => print!("{}", format_stats_table(&stats)),
    }
    Ok(())
}

fn format_stats_table(stats: &HistoryStats) -> String {
    let mut out = format!("Total interactions: {}\n", stats.total_interactions);
    if stats.per_scope.is_empty() {
        out.push_str("No scopes recorded.\n");
        return out;
    }

    out.push_str(&format!(
        "\n{:<30} {:>8} {:>10}  {}\n",
        "SCOPE", "RECORDS", "NEXT INDEX", "LAST INTERACTION"
    ));
    out.push_str(&format!("{}\n", "-".repeat(78)));
    for (scope, s) in &stats.per_scope {
        let last = s
            .last_interaction_timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<30} {:>8} {:>10}  {}\n",
            scope, s.count, s.last_index, last
        ));
    }
    out
}

async fn history_show(app: &App, scope: &str, limit: usize) -> anyhow::Result<()> {
    let history = app.history.get_scope_history(scope).await?;
    println!(
        "Scope '{}': next index {}, {} records",
        scope,
        history.last_index,
        history.records.len()
    );

    for record in app.history.recent(scope, limit).await? {
        println!(
            "  {}  {} ({})\n      {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.target_name,
            record.target_id,
            record.message_text
        );
    }
    Ok(())
}

/// Handle limits subcommands.
pub(crate) async fn handle_limits_command(app: &App, action: LimitsAction) -> anyhow::Result<()> {
    match action {
        LimitsAction::Show => {
            print_limits(&app.config.rate_limit);
            Ok(())
        }
        LimitsAction::Set {
            max_per_hour,
            max_per_day,
            delay_ms,
        } => {
            let limits = merge_limits(
                &app.config,
                &RuntimeOptions {
                    max_per_hour,
                    max_per_day,
                    interaction_delay_ms: delay_ms,
                    ..RuntimeOptions::default()
                },
            )?;

            save_rate_limit_config(app.store.as_ref(), &limits).await?;
            info!("Saved rate-limit settings");
            print_limits(&limits);
            Ok(())
        }
    }
}

/// Overlay new limits on the effective config and validate the result.
fn merge_limits(config: &Config, options: &RuntimeOptions) -> anyhow::Result<RateLimitConfig> {
    let mut config = config.clone();
    config.apply(options);
    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("{}: {}", warning.path, warning.message);
    }
    Ok(config.rate_limit)
}

fn print_limits(limits: &RateLimitConfig) {
    println!("Max per hour: {}", limits.max_per_hour);
    println!("Max per day:  {}", limits.max_per_day);
    println!("Delay:        {} ms", limits.interaction_delay_ms);
}

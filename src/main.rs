// Entry point and high-level CLI flow.
//
// - Option [1] loads every CSV file into a snapshot and prints diagnostics.
// - Option [2] prints the four dashboard views, exports each table as CSV
//   and writes a JSON summary of the KPI tiles.
// - After generating reports, the user can go back to the menu or exit.
//
// `--batch` runs [1] and [2] once without prompting.
mod cli;
mod config;
mod error;
mod loader;
mod output;
mod reports;
mod store;
mod types;
mod util;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use cli::Args;
use config::Config;
use serde::Serialize;
use std::io::{self, Write};
use store::Snapshot;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use types::{CreditStats, DashboardKpis, GenderAmounts, GenderCounts, KpiRow};

#[derive(Serialize)]
struct Summary<'a> {
    generated_at: DateTime<Utc>,
    kpis: &'a DashboardKpis,
    affiliates_by_gender: GenderCounts,
    credit_balances_by_gender: GenderAmounts,
    credit_stats: &'a CreditStats,
    credits_with_unknown_type: usize,
    credits_outside_age_brackets: usize,
}

/// Read a single line after the common "Enter choice:" prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the report selection menu.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]. A failed load keeps nothing and asks for a retry.
fn handle_load(config: &Config) -> Option<Snapshot> {
    let paths = config.data_paths();
    match loader::load_snapshot(&paths) {
        Ok((snapshot, report)) => {
            println!(
                "Processing datasets... ({} files, {} rows loaded)",
                report.files.len(),
                util::format_int(report.loaded_rows())
            );
            if report.skipped_rows() > 0 {
                println!(
                    "Note: {} rows skipped due to parse/validation errors.",
                    util::format_int(report.skipped_rows())
                );
            }
            debug!(records = snapshot.total_records(), "snapshot ready");
            for f in &report.files {
                debug!(file = %f.file, rows = f.rows, skipped = f.skipped, "load summary");
            }
            println!();
            Some(snapshot)
        }
        Err(e) => {
            error!("load failed: {}", e);
            eprintln!("Error loading the data: {}", e);
            eprintln!("Check the data directory and load again (option 1).\n");
            None
        }
    }
}

/// Replace the current snapshot only when the reload succeeded.
fn reload(current: &mut Option<Snapshot>, config: &Config) {
    if let Some(fresh) = handle_load(config) {
        *current = Some(fresh);
    }
}

fn kpi_rows(kpis: &DashboardKpis, parity_threshold: f64) -> Vec<KpiRow> {
    let row = |indicator: &str, value: String| KpiRow {
        indicator: indicator.to_string(),
        value,
    };
    let mut boards = util::format_percent(kpis.women_in_boards_pct);
    if kpis.below_board_parity {
        boards.push_str(&format!(" (below {}% parity)", parity_threshold));
    }
    vec![
        row("Cooperativas activas", util::format_int(kpis.active_cooperatives)),
        row("Afiliados activos", util::format_int(kpis.active_affiliates)),
        row("Mujeres afiliadas", util::format_percent(kpis.female_affiliates_pct)),
        row("Mujeres en directivas", boards),
        row("Cartera de créditos", util::format_lempiras(kpis.total_loan_portfolio)),
        row("Volumen de ahorros", util::format_lempiras(kpis.total_savings)),
        row("Remesas", util::format_usd(kpis.total_remittances_usd)),
    ]
}

/// Handle option [2]: print every view, export its tables and the summary.
fn handle_generate_reports(snapshot: &Snapshot, config: &Config) -> Result<()> {
    let rc = &config.report;
    let out = rc.output_dir.as_path();
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;
    let preview = rc.preview_rows;

    println!("Generating reports...");
    println!("Outputs saved to {}\n", out.display());

    // Executive dashboard
    let kpis = reports::dashboard_kpis(snapshot, rc.board_parity_threshold);
    let kpi_table = kpi_rows(&kpis, rc.board_parity_threshold);
    output::preview_section("Portada Ejecutiva", None, &kpi_table, kpi_table.len());
    output::export_table(out, "kpis", &kpi_table)?;

    let genders = reports::gender_breakdown(snapshot);
    let note = format!("{} afiliados activos clasificados", util::format_int(genders.total()));
    output::preview_section("Afiliados por género", Some(&note), &[genders], 1);
    output::export_table(out, "afiliados_genero", &[genders])?;

    let board = reports::board_shares(snapshot);
    output::preview_section("Participación en órganos", None, &board, board.len());
    output::export_table(out, "participacion_organos", &board)?;

    // Credits
    let stats = reports::credit_stats(snapshot);
    let note = format!(
        "{} créditos, saldo promedio {}",
        util::format_int(stats.total),
        stats
            .avg_balance
            .map(util::format_lempiras_thousands)
            .unwrap_or_else(|| "N/A".to_string())
    );
    output::preview_section("Créditos por género", Some(&note), &stats.rows(), 3);
    output::export_table(out, "creditos_resumen", &stats.rows())?;

    let by_type = reports::credits_by_type_and_gender(snapshot);
    output::preview_section("Créditos por tipo", None, &by_type, preview);
    output::export_table(out, "creditos_tipo", &by_type)?;
    let unknown_type = reports::credits_with_unknown_type(snapshot);
    if unknown_type > 0 {
        warn!(credits = unknown_type, "credits reference a credit type missing from the catalog");
    }

    let balances = reports::credit_balances_by_gender(snapshot);
    output::preview_section("Saldo por género", None, &[balances], 1);
    output::export_table(out, "creditos_saldo", &[balances])?;

    let ages = reports::credits_by_age_group(snapshot);
    output::preview_section("Monto por edad", Some("Millones de lempiras"), &ages, ages.len());
    output::export_table(out, "creditos_edad", &ages)?;
    let outside_ages = reports::credits_outside_age_brackets(snapshot);
    if outside_ages > 0 {
        warn!(credits = outside_ages, "credits without an age between 18 and 150");
    }

    // Diversity
    let positions = reports::positions_by_gender(snapshot);
    println!(
        "Cargos por género: {} mujeres, {} hombres\n",
        util::format_int(positions.mujeres),
        util::format_int(positions.hombres)
    );

    // Geographic
    let top = reports::top_departments_by_portfolio(snapshot, rc.top_departments);
    let note = format!("Top {} por cartera", rc.top_departments);
    output::preview_section("Cartera por departamento", Some(&note), &top, preview);
    output::export_table(out, "departamentos_cartera", &top)?;

    let by_dept = reports::affiliates_by_department(snapshot, Some(rc.department_chart_limit));
    output::preview_section("Afiliados por departamento", None, &by_dept, preview);
    output::export_table(out, "departamentos_afiliados", &by_dept)?;

    let summary = Summary {
        generated_at: Utc::now(),
        kpis: &kpis,
        affiliates_by_gender: genders,
        credit_balances_by_gender: balances,
        credit_stats: &stats,
        credits_with_unknown_type: unknown_type,
        credits_outside_age_brackets: outside_ages,
    };
    output::write_json(&out.join("summary.json"), &summary)?;
    info!(dir = %out.display(), "reports written");
    Ok(())
}

fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists; edit it or remove it first", path.display());
    }
    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_batch(config: &Config) -> Result<()> {
    let snapshot = handle_load(config).context("data could not be loaded")?;
    handle_generate_reports(&snapshot, config)
}

fn run_menu(config: &Config) {
    let mut snapshot: Option<Snapshot> = None;
    loop {
        println!("Select an option:");
        println!("[1] Load the data files");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            println!("Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => {
                reload(&mut snapshot, config);
            }
            "2" => {
                println!();
                let Some(data) = snapshot.as_ref() else {
                    println!(
                        "Error: No data loaded. Please load the data files first (option 1).\n"
                    );
                    continue;
                };
                if let Err(e) = handle_generate_reports(data, config) {
                    error!("report generation failed: {:#}", e);
                    eprintln!("Write error: {:#}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.init_config {
        return handle_init_config();
    }

    init_logging(args.verbose);
    let config = args.merge_into(Config::load(args.config.as_deref())?);
    debug!(?config, "configuration");

    if args.batch {
        run_batch(&config)
    } else {
        run_menu(&config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kpi_rows_mark_parity_gap() {
        let kpis = DashboardKpis {
            active_cooperatives: 1200,
            active_affiliates: 3,
            female_affiliates_pct: None,
            women_in_boards_pct: Some(33.3),
            below_board_parity: true,
            total_loan_portfolio: 1_000_000.0,
            total_savings: 0.0,
            total_remittances_usd: 2_500_000.0,
        };
        let rows = kpi_rows(&kpis, 40.0);
        assert_eq!(rows[0].value, "1,200");
        assert_eq!(rows[2].value, "N/A");
        assert_eq!(rows[3].value, "33.3% (below 40% parity)");
        assert_eq!(rows[4].value, "L 1.00M");
        assert_eq!(rows[6].value, "$ 2.50M");
    }

    #[test]
    fn generate_reports_writes_every_export() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.report.output_dir = tmp.path().join("out");

        let snapshot = Snapshot {
            credits: vec![types::Credit {
                genero: types::Genero::Female,
                saldo_actual: 750_000.0,
                departamento_id: Some(4),
                edad: Some(30),
                ..Default::default()
            }],
            ..Default::default()
        };
        handle_generate_reports(&snapshot, &config).unwrap();

        let out = &config.report.output_dir;
        for name in [
            "kpis.csv",
            "afiliados_genero.csv",
            "participacion_organos.csv",
            "creditos_resumen.csv",
            "creditos_tipo.csv",
            "creditos_saldo.csv",
            "creditos_edad.csv",
            "departamentos_cartera.csv",
            "departamentos_afiliados.csv",
            "summary.json",
        ] {
            assert!(out.join(name).exists(), "missing {}", name);
        }
        let summary = std::fs::read_to_string(out.join("summary.json")).unwrap();
        assert!(summary.contains("\"credits_with_unknown_type\": 1"));
        let depts = std::fs::read_to_string(out.join("departamentos_cartera.csv")).unwrap();
        assert!(depts.contains("Dept 4"));
    }

    #[test]
    fn failed_reload_keeps_the_previous_snapshot() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.data.root = tmp.path().join("missing");

        let mut current = Some(Snapshot {
            credits: vec![types::Credit::default()],
            ..Default::default()
        });
        reload(&mut current, &config);
        assert_eq!(current.map(|s| s.credits.len()), Some(1));
    }
}

// Interactive insights console.
//
// - Option [1] loads the appointment dataset (backend, local file, or
//   sample fallback) and prints load diagnostics.
// - Option [2] renders every report as a console preview, exports the full
//   tables as CSV and writes a JSON summary.
// - After generating reports, the user can go back to the menu or exit.
use laundry_insights::config::{CityDirectory, ProjectionConfig, ALL_CITIES};
use laundry_insights::loader::{filter_valid, LoadReport};
use laundry_insights::types::{
    AvgOrderValueRow, CityStatsRow, DriverRow, FlowRow, LaundromatRow, MonthlyTrendRow,
    ProjectionRow, QuarterRow, WeightRow,
};
use laundry_insights::util::{format_int, format_number};
use laundry_insights::{fetch, logging, output, projection, reports};
use chrono::Local;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

// Session state so the dataset is loaded once but reports can be generated
// multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<laundry_insights::types::Appointment>>,
}

fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the menu after generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: acquire and clean the dataset.
fn handle_load() {
    let cities = CityDirectory::builtin();
    let today = Local::now().date_naive();
    let mut rng = rand::thread_rng();

    let (raw, origin) = fetch::load_dataset(&cities, today, &mut rng);
    let mut report = LoadReport {
        total_records: raw.len(),
        ..LoadReport::default()
    };
    let valid = filter_valid(&raw, today, &mut report);

    println!(
        "Loaded {} records from {} ({} valid for reporting)",
        format_int(report.total_records as u64),
        origin,
        format_int(report.valid_records as u64)
    );
    println!(
        "Excluded: {} incomplete, {} seller-cancelled, {} in the current month.\n",
        format_int(report.dropped_incomplete as u64),
        format_int(report.dropped_cancelled as u64),
        format_int(report.dropped_current_month as u64)
    );

    let mut state = APP_STATE.lock().unwrap();
    state.data = Some(valid);
}

/// Handle option [2]: every aggregate view, previewed and exported.
fn handle_generate_reports() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the dataset first (option 1).\n");
        return;
    };

    let cities = CityDirectory::builtin();
    let projection_config = ProjectionConfig::builtin();
    let today = Local::now().date_naive();

    println!("Generating reports...\n");

    let city_stats = reports::city_statistics(&data, &cities);
    let city_rows: Vec<CityStatsRow> = city_stats.iter().map(Into::into).collect();
    export("reports/city_statistics.csv", &city_rows);
    println!("City Statistics");
    output::preview_table(&city_rows, city_rows.len());

    let all_laundromats = reports::laundromat_statistics(&data);
    let top = reports::top_laundromats(
        &all_laundromats,
        reports::LAUNDROMAT_MIN_ORDERS,
        reports::LAUNDROMAT_LIMIT,
    );
    let laundromat_rows: Vec<LaundromatRow> = top.iter().map(Into::into).collect();
    export("reports/top_laundromats.csv", &laundromat_rows);
    println!(
        "Top Laundromats (>= {} orders, top {})",
        reports::LAUNDROMAT_MIN_ORDERS,
        reports::LAUNDROMAT_LIMIT
    );
    output::preview_table(&laundromat_rows, laundromat_rows.len());

    println!("Customer Types");
    for entry in reports::customer_type_distribution(&data) {
        println!("  {}: {}", entry.name, format_int(entry.value));
    }
    println!();

    let monthly = reports::monthly_orders_trend(&data, &cities, today, reports::DEFAULT_TREND_MONTHS);
    let monthly_rows: Vec<MonthlyTrendRow> = monthly.iter().map(Into::into).collect();
    export("reports/monthly_orders.csv", &monthly_rows);
    println!("Monthly Orders (trailing 12 months, current month excluded)");
    output::preview_table(&monthly_rows, 3);

    let aov = reports::avg_order_value_trend(&data, today, reports::DEFAULT_TREND_MONTHS);
    let aov_rows: Vec<AvgOrderValueRow> = aov.iter().map(Into::into).collect();
    export("reports/avg_order_value.csv", &aov_rows);
    println!("Average Order Value");
    output::preview_table(&aov_rows, 3);

    let retention = reports::customer_retention_metrics(&data);
    println!("Customer Retention");
    println!(
        "  Total customers: {}",
        format_int(retention.total_customers)
    );
    println!(
        "  Returning customers: {}",
        format_int(retention.returning_customers)
    );
    println!(
        "  Retention rate: {}%",
        format_number(retention.retention_rate * 100.0, 1)
    );
    println!(
        "  Avg orders per customer: {}",
        format_number(retention.average_orders_per_customer, 2)
    );
    println!(
        "  Avg customer lifetime: {} days\n",
        format_number(retention.average_customer_lifetime, 1)
    );

    let flows = reports::customer_laundromat_flow(&data, reports::FLOW_LIMIT);
    let flow_rows: Vec<FlowRow> = flows.iter().map(Into::into).collect();
    export("reports/customer_laundromat_flow.csv", &flow_rows);
    println!("Strongest Customer/Laundromat Flows");
    output::preview_table(&flow_rows, 3);

    let drivers = reports::driver_performance(&data);
    let driver_rows: Vec<DriverRow> = drivers.iter().map(Into::into).collect();
    export("reports/driver_performance.csv", &driver_rows);
    println!("Driver Performance");
    output::preview_table(&driver_rows, 3);

    let seasonal = reports::seasonal_trends(&data);
    let quarter_rows: Vec<QuarterRow> = seasonal.iter().map(Into::into).collect();
    export("reports/seasonal_trends.csv", &quarter_rows);
    println!("Seasonal Trends (all years combined)");
    output::preview_table(&quarter_rows, quarter_rows.len());

    let weights = reports::weight_distribution(&data);
    let weight_rows: Vec<WeightRow> = weights.iter().map(Into::into).collect();
    export("reports/weight_distribution.csv", &weight_rows);
    println!("Order Weight Distribution");
    output::preview_table(&weight_rows, weight_rows.len());

    let mut rng = rand::thread_rng();
    let forecast = projection::generate_projections(
        &monthly,
        ALL_CITIES,
        projection::DEFAULT_WEEKS_AHEAD,
        &cities,
        &projection_config,
        today,
        &mut rng,
    );
    let projection_rows: Vec<ProjectionRow> = forecast.combined.iter().map(Into::into).collect();
    export("reports/weekly_projection.csv", &projection_rows);
    println!("Weekly Projection ({})", forecast.metrics.city_name);
    println!(
        "  Projected annual orders: {}",
        format_int(forecast.metrics.total_annual_orders)
    );
    println!(
        "  Avg weekly orders: {}",
        format_int(forecast.metrics.average_weekly_orders)
    );
    println!(
        "  Projected growth: {}%\n",
        format_number(forecast.metrics.projected_growth_percent, 1)
    );

    let summary = reports::insight_summary(&data, &retention);
    if let Err(e) = output::write_json(Path::new("reports/summary.json"), &summary) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Summary written to reports/summary.json (total revenue: ${})\n",
        format_number(summary.total_revenue, 2)
    );
}

fn export<T: serde::Serialize>(path: &str, rows: &[T]) {
    if let Err(e) = output::write_csv(Path::new(path), rows) {
        eprintln!("Write error: {}", e);
    }
}

fn main() {
    logging::init();
    loop {
        println!("Laundry Insights");
        println!("[1] Load appointment data");
        println!("[2] Generate reports\n");
        match read_choice().as_str() {
            "1" => handle_load(),
            "2" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}

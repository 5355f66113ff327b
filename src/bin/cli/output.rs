use assetdesk::cron::SweepReport;
use assetdesk::dto::{Dashboard, DepreciationReport, LoginResponse, OverdueCheckout};
use assetdesk::models::{Asset, Inventory};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

/// Prints any response body as pretty JSON
fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: could not encode output: {}", e),
    }
}

/// Prints the token from a successful login
pub fn print_login(response: &LoginResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("Signed in as {} ({})", response.user.email, response.user.role);
                println!("Export it to stay signed in: export ASSETDESK_TOKEN={}", response.token);
                return;
            }
            println!("{}", response.token);
        }
        OutputFormat::Json => print_json(response),
    }
}

/// Prints a list of assets in the specified format
pub fn print_assets(assets: &[Asset], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if assets.is_empty() {
                if !config.quiet {
                    println!("No assets found.");
                }
                return;
            }
            if config.quiet {
                for asset in assets {
                    println!("{}", asset.id);
                }
                return;
            }
            let max_id = assets.iter().map(|a| a.id.len()).max().unwrap_or(2);
            let max_serial = assets.iter().map(|a| a.serial_number.len()).max().unwrap_or(6).max(6);
            println!(
                "{:<id_w$}  {:<serial_w$}  {:<14}  NAME",
                "ID",
                "SERIAL",
                "STATUS",
                id_w = max_id,
                serial_w = max_serial,
            );
            for asset in assets {
                println!(
                    "{:<id_w$}  {:<serial_w$}  {:<14}  {}",
                    asset.id,
                    asset.serial_number,
                    asset.status.as_str(),
                    asset.name,
                    id_w = max_id,
                    serial_w = max_serial,
                );
            }
        }
        OutputFormat::Json => print_json(assets),
    }
}

/// Prints a single asset in the specified format
pub fn print_asset(asset: &Asset, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", asset.id);
                return;
            }
            println!("ID:            {}", asset.id);
            println!("Name:          {}", asset.name);
            println!("Serial:        {}", asset.serial_number);
            println!("Status:        {}", asset.status);
            println!("Type:          {}", asset.asset_type_id);
            println!("Location:      {}", asset.location_id.as_deref().unwrap_or("-"));
            println!("Purchased:     {} for {:.2}", asset.purchase_date, asset.purchase_cost);
            println!("Salvage value: {:.2}", asset.salvage_value);
            println!("Useful life:   {} years", asset.useful_life_years);
            if let Some(notes) = &asset.notes {
                println!("Notes:         {}", notes);
            }
        }
        OutputFormat::Json => print_json(asset),
    }
}

/// Prints a list of inventory items in the specified format
pub fn print_inventory(items: &[Inventory], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if items.is_empty() {
                if !config.quiet {
                    println!("No inventory items found.");
                }
                return;
            }
            if config.quiet {
                for item in items {
                    println!("{}", item.id);
                }
                return;
            }
            let max_sku = items.iter().map(|i| i.sku.len()).max().unwrap_or(3).max(3);
            println!("{:<sku_w$}  {:>8}  {:>8}  {:>10}  NAME", "SKU", "QTY", "MIN", "UNIT COST", sku_w = max_sku);
            for item in items {
                let marker = if item.is_low_stock() { " (low)" } else { "" };
                println!(
                    "{:<sku_w$}  {:>8}  {:>8}  {:>10.2}  {}{}",
                    item.sku,
                    item.quantity,
                    item.min_quantity,
                    item.unit_cost,
                    item.name,
                    marker,
                    sku_w = max_sku,
                );
            }
        }
        OutputFormat::Json => print_json(items),
    }
}

/// Prints the depreciation report in the specified format
pub fn print_depreciation(report: &DepreciationReport, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{:.2}", report.total_current_value);
                return;
            }
            println!("Depreciation as of {}", report.as_of);
            println!("{:<24}  {:>12}  {:>12}  {:>12}", "ASSET", "COST", "ACCUMULATED", "VALUE");
            for row in &report.rows {
                println!(
                    "{:<24}  {:>12.2}  {:>12.2}  {:>12.2}",
                    row.name, row.purchase_cost, row.accumulated, row.current_value
                );
            }
            println!(
                "{:<24}  {:>12.2}  {:>12.2}  {:>12.2}",
                "TOTAL", report.total_purchase_cost, report.total_accumulated, report.total_current_value
            );
        }
        OutputFormat::Json => print_json(report),
    }
}

/// Prints overdue checkouts in the specified format
pub fn print_overdue(rows: &[OverdueCheckout], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if rows.is_empty() {
                if !config.quiet {
                    println!("No overdue checkouts.");
                }
                return;
            }
            if config.quiet {
                for row in rows {
                    println!("{}", row.checkout.id);
                }
                return;
            }
            println!("{:<24}  {:<24}  DUE BACK", "ASSET", "EMPLOYEE");
            for row in rows {
                let due = row
                    .checkout
                    .expected_return_at
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<24}  {:<24}  {}", row.asset_name, row.employee_name, due);
            }
        }
        OutputFormat::Json => print_json(rows),
    }
}

/// Prints the dashboard in the specified format
pub fn print_dashboard(dashboard: &Dashboard, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", dashboard.assets.total);
                return;
            }
            let assets = &dashboard.assets;
            println!(
                "Assets:               {} ({} available, {} checked out, {} in maintenance, {} retired)",
                assets.total, assets.available, assets.checked_out, assets.in_maintenance, assets.retired
            );
            println!("Purchase cost:        {:.2}", dashboard.total_purchase_cost);
            println!("Current value:        {:.2}", dashboard.total_current_value);
            println!("Low stock items:      {}", dashboard.low_stock_count);
            println!("Inventory value:      {:.2}", dashboard.inventory_value);
            println!("Overdue checkouts:    {}", dashboard.overdue_checkout_count);
            println!("Upcoming maintenance: {}", dashboard.upcoming_maintenance_count);
            println!("Maintenance cost:     {:.2}", dashboard.total_maintenance_cost);
        }
        OutputFormat::Json => print_json(dashboard),
    }
}

/// Prints what a sweep did
pub fn print_sweep(report: &SweepReport, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", report.total());
                return;
            }
            println!("Maintenance reminders: {}", report.maintenance_reminders);
            println!("Overdue notices:       {}", report.overdue_notices);
            println!("Low stock notices:     {}", report.low_stock_notices);
        }
        OutputFormat::Json => print_json(report),
    }
}

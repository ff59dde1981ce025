use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use common::{
    export::export_records_to_csv,
    filters::{FilterForm, PageCursor},
    models::{ChartSeries, InventoryRecord},
    network::{ApiError, DEFAULT_SERVER, NetworkClient},
    pagination::pagination_info,
    upload::{SelectedFile, format_file_size},
};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Color, Style, object::Rows},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

fn print_table(rows: &[impl Tabled]) {
    if rows.is_empty() {
        println!("No entries");
    } else {
        let mut table = Table::new(rows);
        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Alignment::center());
        table.modify(Rows::first(), Color::FG_CYAN);
        println!("{}", table);
    }
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "SKU")]
    sku: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Inbound")]
    inbound: String,
    #[tabled(rename = "Outbound")]
    outbound: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Supplier")]
    supplier: String,
    #[tabled(rename = "Operator")]
    operator: String,
    #[tabled(rename = "Remarks")]
    remarks: String,
}

impl From<&InventoryRecord> for RecordRow {
    fn from(record: &InventoryRecord) -> Self {
        let [id, date, sku, product, inbound, outbound, balance, supplier, operator, remarks] =
            record.cells();
        Self {
            id,
            date,
            sku,
            product,
            inbound,
            outbound,
            balance,
            supplier,
            operator,
            remarks,
        }
    }
}

#[derive(Tabled)]
struct SupplierRow {
    #[tabled(rename = "Supplier")]
    name: String,
}

#[derive(Tabled)]
struct BalanceRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Inventory balance")]
    balance: f64,
}

fn balance_rows(series: &ChartSeries) -> Vec<BalanceRow> {
    series
        .points()
        .map(|(date, balance)| BalanceRow {
            date: date.to_string(),
            balance,
        })
        .collect()
}

/// Filter flags shared by the record and chart commands.
#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    /// Substring of the product name.
    #[arg(long)]
    product: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
}

impl From<FilterArgs> for FilterForm {
    fn from(args: FilterArgs) -> Self {
        Self {
            start_date: args.start_date.unwrap_or_default(),
            end_date: args.end_date.unwrap_or_default(),
            sku: args.sku.unwrap_or_default(),
            product_name_like: args.product.unwrap_or_default(),
            supplier: args.supplier.unwrap_or_default(),
        }
    }
}

/// Inventory ledger CLI
#[derive(Debug, Parser)]
#[command(name = "Stock Ledger Cli")]
#[command(version = "0.1.0")]
#[command(about = "Query inventory records and import stock sheets", long_about = None)]
struct Cli {
    #[arg(long, global = true, default_value = DEFAULT_SERVER)]
    server: Url,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the distinct supplier names.
    Suppliers,
    /// Show one page of inventory records.
    Records {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Also write the page to a CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the balance series behind the trend chart.
    Chart {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Import an .xlsx stock sheet.
    Upload { path: PathBuf },
}

fn describe(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::Application {
            message, errors, ..
        } if !errors.is_empty() => {
            anyhow::anyhow!("{}\n  {}", message, errors.join("\n  "))
        }
        other => other.into(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Cli::parse();
    let network = NetworkClient::new(args.server)?;
    debug!("Using server {}", network.base_url());

    match args.command {
        Commands::Suppliers => {
            let suppliers = network.suppliers().await.map_err(describe)?;
            let rows: Vec<_> = suppliers.into_iter().map(|name| SupplierRow { name }).collect();
            print_table(&rows);
        }
        Commands::Records { filters, page, csv } => {
            let filters = FilterForm::from(filters).filters();
            let mut cursor = PageCursor::default();
            cursor.go_to(page);
            let page = network.records(cursor, &filters).await.map_err(describe)?;
            let rows: Vec<RecordRow> = page.items.iter().map(RecordRow::from).collect();
            print_table(&rows);
            println!("{} (page {} of {})", pagination_info(&page), page.page, page.pages.max(1));
            if let Some(path) = csv {
                export_records_to_csv(&path, &page.items)?;
                println!("Wrote {} records to {}", page.items.len(), path.display());
            }
        }
        Commands::Chart { filters } => {
            let filters = FilterForm::from(filters).filters();
            let series = network.chart_data(&filters).await.map_err(describe)?;
            print_table(&balance_rows(&series));
        }
        Commands::Upload { path } => {
            let file = SelectedFile::inspect(&path)?;
            println!("Uploading {} ({})", file.name, format_file_size(file.size));
            let message = network.upload(&file).await.map_err(describe)?;
            println!("{}", message);
        }
    }

    Ok(())
}

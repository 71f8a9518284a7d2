//! Catalog Admin CLI
//!
//! Runs the HTTP admin API or performs one catalog operation and exits.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use catalog_admin::catalog::CascadeOverflow;
use catalog_admin::catalog::importer::load_records;
use catalog_admin::core::StoreBackend;
use catalog_admin::{
    CatalogService, Config, EmployeeState, ProductState, Server, ServerState, print_banner,
    setup_environment,
};

#[derive(Parser)]
#[command(name = "catalog-admin")]
#[command(about = "Product catalog and employee registry administration")]
#[command(version)]
struct Cli {
    /// Store backend (rest | memory)
    #[arg(long, global = true)]
    backend: Option<StoreBackend>,

    /// Log level (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP admin API
    Serve {
        #[arg(long, env = "HTTP_PORT")]
        port: Option<u16>,
    },

    /// Leaf product operations
    #[command(subcommand)]
    Products(ProductsCommand),

    /// Hierarchy operations
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Employee registry operations
    #[command(subcommand)]
    Employees(EmployeesCommand),

    /// Print dashboard figures
    Stats,
}

#[derive(Subcommand)]
enum ProductsCommand {
    /// List every leaf product
    List,

    /// Import products from a JSON array file
    Import {
        file: PathBuf,

        /// Commit in chunks instead of one atomic batch
        #[arg(long)]
        chunked: bool,
    },

    /// Delete every leaf product
    DeleteAll {
        /// Confirm the delete
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// Delete a company, category or subcategory with all its descendants
    Delete {
        company: String,
        category: Option<String>,
        subcategory: Option<String>,

        /// Refuse subtrees larger than one batch instead of splitting
        #[arg(long)]
        reject_overflow: bool,
    },
}

#[derive(Subcommand)]
enum EmployeesCommand {
    /// List the merged registry
    List,

    /// Sweep the deprecated field and report the outcome
    Migrate,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = setup_environment(cli.log_level.as_deref());
    if let Some(backend) = cli.backend {
        config.store_backend = backend;
    }

    match cli.command {
        Commands::Serve { port } => serve(config, port).await,
        Commands::Products(cmd) => products(config, cmd).await,
        Commands::Catalog(cmd) => catalog(config, cmd).await,
        Commands::Employees(cmd) => employees(config, cmd).await,
        Commands::Stats => stats(config).await,
    }
}

async fn serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.http_port = port;
    }
    print_banner();
    tracing::info!(environment = %config.environment, "Catalog admin starting...");

    let state = ServerState::initialize(&config).context("Failed to open document store")?;
    if let Err(e) = Server::new(state).run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }
    Ok(())
}

fn open_service(config: &Config) -> anyhow::Result<CatalogService<dyn doc_store::DocumentStore>> {
    let state = ServerState::initialize(config).context("Failed to open document store")?;
    Ok(state.service)
}

async fn products(mut config: Config, cmd: ProductsCommand) -> anyhow::Result<()> {
    if let ProductsCommand::Import { chunked: true, .. } = &cmd {
        config.chunked_import = true;
    }
    let service = open_service(&config)?;
    let mut state = ProductState::default();

    match cmd {
        ProductsCommand::List => {
            let products = service.fetch_products(&mut state).await?;
            print_json(&products)?;
        }
        ProductsCommand::Import { file, .. } => {
            let records = load_records(&file)?;
            let count = service.import_products(&mut state, &records).await?;
            println!("Imported {} products from {}", count, file.display());
        }
        ProductsCommand::DeleteAll { yes } => {
            if !yes {
                bail!("Refusing to delete every product without --yes");
            }
            let count = service.delete_all_products(&mut state).await?;
            println!("Deleted {} products", count);
        }
    }
    Ok(())
}

async fn catalog(mut config: Config, cmd: CatalogCommand) -> anyhow::Result<()> {
    let CatalogCommand::Delete {
        company,
        category,
        subcategory,
        reject_overflow,
    } = cmd;
    if reject_overflow {
        config.cascade_overflow = CascadeOverflow::Reject;
    }
    let service = open_service(&config)?;
    let mut state = ProductState::default();

    let outcome = match (category, subcategory) {
        (None, None) => {
            service
                .delete_company_hierarchy(&mut state, &company)
                .await?
        }
        (Some(category), None) => {
            service
                .delete_category_hierarchy(&mut state, &company, &category)
                .await?
        }
        (Some(category), Some(subcategory)) => {
            service
                .delete_subcategory_hierarchy(&mut state, &company, &category, &subcategory)
                .await?
        }
        (None, Some(_)) => bail!("A subcategory needs its category"),
    };
    print_json(&outcome)
}

async fn employees(config: Config, cmd: EmployeesCommand) -> anyhow::Result<()> {
    let service = open_service(&config)?;
    let mut state = EmployeeState::default();
    let employees = service.fetch_employees(&mut state).await?.to_vec();

    match cmd {
        EmployeesCommand::List => print_json(&employees),
        EmployeesCommand::Migrate => {
            let report = state.last_migration.unwrap_or_default();
            print_json(&report)?;
            if report.partial {
                bail!(
                    "Migration incomplete: {} of {} records cleared",
                    report.cleared,
                    report.scheduled
                );
            }
            Ok(())
        }
    }
}

async fn stats(config: Config) -> anyhow::Result<()> {
    let service = open_service(&config)?;
    let mut products = ProductState::default();
    let mut employees = EmployeeState::default();
    service.fetch_products(&mut products).await?;
    service.fetch_employees(&mut employees).await?;
    print_json(&service.stats(&products, &employees))
}

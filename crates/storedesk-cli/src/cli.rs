//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use storedesk_core::listing::ColumnSearch;
use storedesk_core::models::OrderStatus;
use storedesk_core::routes::FormTarget;
use storedesk_core::Resource;

#[derive(Parser, Debug)]
#[command(name = "storedesk", about = "Back-office console for the storedesk shop", version)]
pub struct Args {
    /// Backend base URL (overrides config and STOREDESK_API)
    #[arg(long, global = true)]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session token
    Login {
        /// Username (defaults to STOREDESK_USERNAME or the last used username)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted when omitted; STOREDESK_PASSWORD is also read)
        #[arg(long, env = "STOREDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Show whether the stored session is valid
    Status,

    /// Navigate to a path and report what would render
    Open {
        /// Path such as /product or /user/12
        path: String,
    },

    /// List a resource as a filtered, paginated table
    List {
        resource: ResourceArg,

        /// Case-insensitive search text matched against any column
        #[arg(short, long)]
        search: Option<String>,

        /// Search one column, e.g. `--column name=an`; repeat to narrow further
        #[arg(long = "column", value_name = "COLUMN=TEXT", value_parser = parse_column_search)]
        columns: Vec<ColumnSearch>,

        /// Status filter (1/0, true/false for products, PENDING.. for orders)
        #[arg(long)]
        status: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Show one record as JSON
    Show { resource: ResourceArg, id: i64 },

    /// Delete one record
    Delete { resource: ResourceArg, id: i64 },

    /// Create or update a record from a JSON file
    Save {
        resource: ResourceArg,

        /// `create` (or `new`) for a new record, otherwise the record id
        #[arg(value_parser = parse_form_target)]
        target: FormTarget,

        /// JSON file holding the record fields
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Move an order to a new status
    OrderStatus {
        id: i64,
        #[arg(value_parser = parse_order_status)]
        status: OrderStatus,
    },

    /// Preview a product's images and what saving it would upload
    Media {
        /// Product id
        product: i64,

        /// Newly selected image files
        #[arg(long = "add")]
        add: Vec<PathBuf>,

        /// Preview positions to remove (applied in the order given)
        #[arg(long = "remove")]
        remove: Vec<usize>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ResourceArg {
    #[value(alias = "inforweb")]
    StoreInfo,
    Branch,
    Category,
    User,
    Product,
    Order,
}

impl From<ResourceArg> for Resource {
    fn from(arg: ResourceArg) -> Self {
        match arg {
            ResourceArg::StoreInfo => Resource::StoreInfo,
            ResourceArg::Branch => Resource::Branch,
            ResourceArg::Category => Resource::Category,
            ResourceArg::User => Resource::User,
            ResourceArg::Product => Resource::Product,
            ResourceArg::Order => Resource::Order,
        }
    }
}

fn parse_order_status(s: &str) -> Result<OrderStatus, String> {
    s.parse()
}

fn parse_form_target(s: &str) -> Result<FormTarget, String> {
    FormTarget::parse(s).ok_or_else(|| format!("expected an id, `create` or `new`, got '{}'", s))
}

fn parse_column_search(s: &str) -> Result<ColumnSearch, String> {
    match s.split_once('=') {
        Some((column, text)) if !column.trim().is_empty() => Ok(ColumnSearch {
            column: column.trim().to_string(),
            text: text.to_string(),
        }),
        _ => Err(format!("expected COLUMN=TEXT, got '{}'", s)),
    }
}

//! CLI entry and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use weda_core::api::ApiClient;
use weda_core::auth::SessionManager;
use weda_core::catalog::PageQuery;
use weda_core::config::Config;
use weda_core::credentials::CredentialStore;

mod commands;

#[derive(Parser)]
#[command(name = "weda")]
#[command(version = "0.1.0")]
#[command(about = "Wedahamine storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a new account
    Register,

    /// Log in and store the session
    Login {
        /// Account email (prompted for if omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Clear the stored session
    Logout,

    /// Show the current session
    Status,

    /// Reset a forgotten password with an emailed code
    ForgotPassword {
        /// Account email (prompted for if omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Browse products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Browse product categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProductCommands {
    /// List one page of products
    List {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Page size
        #[arg(long, value_name = "N", default_value_t = 10)]
        per_page: u32,

        /// Filter by search term
        #[arg(long, default_value = "")]
        search: String,

        /// Field to sort by
        #[arg(long, default_value = "productId")]
        sort: String,

        /// Sort direction (asc or desc)
        #[arg(long, default_value = "asc")]
        direction: String,
    },
    /// Show a single product
    Show {
        /// The ID of the product to show
        #[arg(value_name = "PRODUCT_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum CategoryCommands {
    /// List one page of categories
    List {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Page size
        #[arg(long, value_name = "N", default_value_t = 10)]
        per_page: u32,

        /// Filter by search term
        #[arg(long, default_value = "")]
        search: String,

        /// Field to sort by
        #[arg(long, default_value = "categoryId")]
        sort: String,

        /// Sort direction (asc or desc)
        #[arg(long, default_value = "asc")]
        direction: String,
    },
    /// Show a single category
    Show {
        /// The ID of the category to show
        #[arg(value_name = "CATEGORY_ID")]
        id: i64,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the API base URL
    SetUrl {
        /// Absolute http(s) URL of the Wedahamine API
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = crate::logging::init()?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Shared client state for commands that talk to the API.
struct App {
    api: Arc<ApiClient>,
    manager: Arc<SessionManager>,
}

/// Builds the API client and session manager, then restores any stored
/// session so requests carry the saved bearer token.
fn connect(config: &Config) -> Result<App> {
    let base_url = config.resolved_base_url()?;
    tracing::debug!("using API endpoint {base_url}");

    let api = Arc::new(ApiClient::new(base_url, config.request_timeout())?);
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&api),
        CredentialStore::open_default(),
    ));
    manager.restore_session();

    Ok(App { api, manager })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;

    match cli.command {
        Commands::Register => {
            let app = connect(&config)?;
            commands::auth::register(&app.manager).await
        }
        Commands::Login { email } => {
            let app = connect(&config)?;
            commands::auth::login(&app.manager, email.as_deref()).await
        }
        Commands::Logout => {
            let app = connect(&config)?;
            commands::auth::logout(&app.manager)
        }
        Commands::Status => {
            let app = connect(&config)?;
            commands::auth::status(&app.manager)
        }
        Commands::ForgotPassword { email } => {
            let app = connect(&config)?;
            commands::auth::forgot_password(Arc::clone(&app.manager), email.as_deref()).await
        }

        Commands::Products { command } => {
            let app = connect(&config)?;
            match command {
                ProductCommands::List {
                    page,
                    per_page,
                    search,
                    sort,
                    direction,
                } => {
                    let query = PageQuery {
                        page,
                        per_page,
                        search,
                        sort,
                        direction,
                    };
                    commands::catalog::products_list(&app.api, &query).await
                }
                ProductCommands::Show { id } => commands::catalog::products_show(&app.api, id).await,
            }
        }

        Commands::Categories { command } => {
            let app = connect(&config)?;
            match command {
                CategoryCommands::List {
                    page,
                    per_page,
                    search,
                    sort,
                    direction,
                } => {
                    let query = PageQuery {
                        page,
                        per_page,
                        search,
                        sort,
                        direction,
                    };
                    commands::catalog::categories_list(&app.api, &query).await
                }
                CategoryCommands::Show { id } => {
                    commands::catalog::categories_show(&app.api, id).await
                }
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&url),
        },
    }
}

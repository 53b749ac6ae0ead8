//! Zone7 CLI - the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! z7 shop list
//! z7 shop filter category Shoes
//! z7 shop show 12
//!
//! # Cart (a guest cart until you log in)
//! z7 cart add 12 --size M --quantity 2
//! z7 cart set 12:M 3
//!
//! # Account
//! z7 auth login -e mona@zone7.eg -p 'Secret1'
//! z7 wishlist toggle 12
//! z7 checkout place --phone 01000000000 --address "1 Nile St" --city Cairo
//! z7 orders
//! ```
//!
//! Login, filters and the guest cart persist in a JSON state file
//! (`ZONE7_STATE_FILE`, default `.zone7-state.json`). The CMS is configured
//! the same way as the server (`ZONE7_CMS_URL`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use zone7_core::order::{CheckoutForm, DEFAULT_COUNTRY, PaymentMethod};
use zone7_storefront::services::Registration;

mod commands;
mod context;
mod output;

use commands::shop::FilterCommand;
use context::{CliError, Context};

#[derive(Parser)]
#[command(name = "z7")]
#[command(author, version, about = "Zone7 storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, register or log out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse the catalog
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Review the cart or place an order
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// List your orders
    Orders,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Forget the stored login
    Logout,
    /// Show the logged-in user
    Whoami,
}

#[derive(Subcommand)]
enum ShopAction {
    /// Products matching the saved filters
    List {
        /// Jump to a page
        #[arg(long)]
        page: Option<usize>,
    },
    /// Change the saved filters
    Filter {
        #[command(subcommand)]
        command: FilterCommand,
    },
    /// Product detail with related products
    Show { id: i64 },
    /// Search products by name
    Search { term: String },
    /// Categories with product counts
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: i64,

        /// Defaults to the product's first size
        #[arg(short, long)]
        size: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity
    Set { line_id: String, quantity: u32 },
    /// Remove a line
    Remove { line_id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Save or unsave a product
    Toggle { product_id: i64 },
    /// Move a saved product into the cart
    Move {
        product_id: i64,

        #[arg(short, long)]
        size: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a saved product
    Remove { product_id: i64 },
    /// Empty the wishlist
    Clear,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Revalidate stock and prices without ordering
    Review,
    /// Place an order for the cart
    Place {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        address: String,

        #[arg(long, default_value = "Cairo")]
        city: String,

        #[arg(long, default_value = DEFAULT_COUNTRY)]
        country: String,

        /// `cod` or `card`
        #[arg(long, default_value = "cod")]
        payment: PaymentMethod,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&ctx, &email, &password).await?;
            }
            AuthAction::Register {
                username,
                email,
                password,
                confirm_password,
            } => {
                let form = Registration {
                    username,
                    email,
                    confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                    password,
                };
                commands::auth::register(&ctx, &form).await?;
            }
            AuthAction::Logout => commands::auth::logout(&ctx).await?,
            AuthAction::Whoami => commands::auth::whoami(&ctx).await?,
        },
        Commands::Shop { action } => match action {
            ShopAction::List { page } => commands::shop::list(&ctx, page).await?,
            ShopAction::Filter { command } => commands::shop::filter(&ctx, command).await?,
            ShopAction::Show { id } => commands::shop::show(&ctx, id).await?,
            ShopAction::Search { term } => commands::shop::search(&ctx, &term).await?,
            ShopAction::Categories => commands::shop::categories(&ctx).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add {
                product_id,
                size,
                quantity,
            } => commands::cart::add(&ctx, product_id, size.as_deref(), quantity).await?,
            CartAction::Set { line_id, quantity } => {
                commands::cart::set(&ctx, &line_id, quantity).await?;
            }
            CartAction::Remove { line_id } => commands::cart::remove(&ctx, &line_id).await?,
            CartAction::Clear => commands::cart::clear(&ctx).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&ctx).await?,
            WishlistAction::Toggle { product_id } => {
                commands::wishlist::toggle(&ctx, product_id).await?;
            }
            WishlistAction::Move {
                product_id,
                size,
                quantity,
            } => {
                commands::wishlist::move_to_cart(&ctx, product_id, size.as_deref(), quantity)
                    .await?;
            }
            WishlistAction::Remove { product_id } => {
                commands::wishlist::remove(&ctx, product_id).await?;
            }
            WishlistAction::Clear => commands::wishlist::clear(&ctx).await?,
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::Review => commands::checkout::review(&ctx).await?,
            CheckoutAction::Place {
                name,
                phone,
                address,
                city,
                country,
                payment,
            } => {
                let form = CheckoutForm {
                    customer_name: name,
                    phone_number: phone,
                    shipping_address: address,
                    country,
                    city,
                    payment_method: payment,
                };
                commands::checkout::place(&ctx, form).await?;
            }
        },
        Commands::Orders => commands::checkout::orders(&ctx).await?,
    }
    Ok(())
}

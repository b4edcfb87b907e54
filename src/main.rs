//! Gourmet Cart CLI - drives the cart engine against a file-backed store.
//!
//! # Usage
//!
//! ```bash
//! # Add two 50g tins of a product fetched from the catalog API
//! gourmet-cart add --catalog truffle.json --variant 50g --quantity 2
//!
//! # Change or remove a line
//! gourmet-cart set truffle_50g 3
//! gourmet-cart remove truffle_50g
//!
//! # Show the cart and totals, then place the order
//! gourmet-cart show
//! gourmet-cart checkout --email buyer@example.com
//! ```
//!
//! Every invocation reloads the cart from disk, the same way a page reload
//! does in the browser.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gourmet_cart::{
    checkout, CartConfig, CartDisplay, CartEngine, CartError, CartId, CartStore, CatalogItem, CatalogRecord,
    CheckoutSummary, FileSlot, OutboxSubmitter, PriceFormat,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gourmet-cart")]
#[command(author, version, about = "Storefront cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cart lines and totals
    Show,
    /// Add a product from a catalog snapshot (JSON product-detail payload)
    Add {
        /// Path to the product-detail JSON
        #[arg(short, long)]
        catalog: PathBuf,

        /// Weight option id, for products sold by weight
        #[arg(short, long)]
        variant: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        cart_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { cart_id: String },
    /// Empty the cart
    Clear,
    /// Hand the cart over as an order
    Checkout {
        #[arg(short, long)]
        email: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CartConfig::from_env()?;
    let cli = Cli::parse();

    let store = CartStore::new(FileSlot::new(&config.data_dir), config.storage_key.clone());
    let mut engine = CartEngine::new(store, config.shipping);
    let format = PriceFormat::new(config.currency_symbol.clone());
    let display = Rc::new(RefCell::new(CartDisplay::new(format.clone())));
    let summary = Rc::new(RefCell::new(CheckoutSummary::new(format, config.shipping)));
    engine.subscribe(Rc::clone(&display));
    engine.subscribe(Rc::clone(&summary));

    match cli.command {
        Commands::Show => {}
        Commands::Add { catalog, variant, quantity } => {
            let raw = fs::read_to_string(&catalog).with_context(|| format!("reading {}", catalog.display()))?;
            let record: CatalogRecord = serde_json::from_str(&raw).with_context(|| format!("parsing {}", catalog.display()))?;
            let item = CatalogItem::try_from(record)?;
            match engine.add_item(&item, quantity, variant.as_deref()) {
                Ok(resulting) => println!("Added. {} now in cart.", resulting),
                Err(CartError::InsufficientStock { available }) => {
                    println!("Sorry, only {available} available.");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Set { cart_id, quantity } => engine.set_quantity(&CartId::from(cart_id.as_str()), quantity),
        Commands::Remove { cart_id } => engine.remove_item(&CartId::from(cart_id.as_str())),
        Commands::Clear => engine.clear(),
        Commands::Checkout { email } => {
            let mut outbox = OutboxSubmitter::new(&config.outbox_dir);
            let confirmation = checkout(&mut engine, &mut outbox, email)?;
            println!("Order {} placed, total {}.", confirmation.reference, confirmation.total);
            println!("Written to {}", outbox.path_for(&confirmation.reference).display());
            return Ok(());
        }
    }

    print!("{}", display.borrow().render_text());
    if !display.borrow().view().is_empty() {
        print!("{}", summary.borrow().render_text());
    }
    Ok(())
}

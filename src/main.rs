use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nosta_quote::{
    catalog::OptionResolver,
    config::Settings,
    handlers::{
        chat_message::{ChatClient, ChatError, ChatReply, MISSING_WEBHOOK_NOTICE},
        document_ingest::{DocumentClient, IngestError, parse_pasted_items, quote_items},
    },
    models::{
        cart::Cart,
        configuration::Configuration,
        document::{DocumentHeader, ItemMapper},
        price_breakdown::PriceBreakdown,
        product_family::ProductFamily,
    },
    pricing::{PriceEngine, PricingStrategy},
    utils::{
        currency::format_eur,
        unit::{MassUnit, convert_mass},
    },
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Parser)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Args {
    #[arg(
        long,
        global = true,
        help = "(Optional) Sets the configuration file path.",
        required = false
    )]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Prices one part configuration.
    Price {
        #[command(flatten)]
        part: PartArgs,

        #[arg(long, help = "(Optional) Overrides the configured pricing strategy.")]
        strategy: Option<PricingStrategy>,

        #[arg(long, help = "Prints only the { price } response as JSON.")]
        json_output: bool,
    },
    /// Calculates the weight of a part from its geometry.
    Weight {
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        #[arg(long)]
        depth: f64,
        #[arg(long, default_value = "C45")]
        material: String,
        #[arg(long, default_value = "g")]
        unit: MassUnit,
    },
    /// Lists the legal options of a product group.
    Options {
        #[arg(long, default_value = "Passfeder (Keyway)")]
        group: ProductFamily,
    },
    /// Lists the product groups of the catalog.
    Groups,
    /// Prices a JSON array of configurations as one quote.
    Quote {
        #[arg(help = "JSON file with an array of configurations ('-' for stdin).")]
        items: PathBuf,

        #[command(flatten)]
        output: QuoteArgs,
    },
    /// Extracts and prices the positions of an RFQ or order document.
    Ingest {
        #[arg(help = "Document to upload to the ingestion webhook.", required_unless_present = "paste")]
        file: Option<PathBuf>,

        #[arg(long, help = "Reads already extracted items (JSON, JSON array or NDJSON) instead.")]
        paste: Option<PathBuf>,

        #[command(flatten)]
        output: QuoteArgs,
    },
    /// Talks to the sales chat agent. Reads stdin when no message is given.
    Chat {
        #[arg(long)]
        message: Option<String>,

        #[arg(long, help = "(Optional) Overrides the configured pricing strategy.")]
        strategy: Option<PricingStrategy>,
    },
    /// Lists saved quotes.
    Quotes,
}

#[derive(clap::Args, Clone)]
pub struct QuoteArgs {
    #[arg(long, help = "(Optional) Overrides the configured pricing strategy.")]
    pub strategy: Option<PricingStrategy>,

    #[arg(long, help = "Saves the quote to the quote store.")]
    pub save: bool,

    #[arg(long)]
    pub rfq: Option<String>,

    #[arg(long)]
    pub customer: Option<String>,
}

#[derive(clap::Args, Clone)]
pub struct PartArgs {
    #[arg(long, help = "Reads the configuration from a JSON file ('-' for stdin).")]
    pub json: Option<PathBuf>,

    #[arg(long, default_value = "Passfeder (Keyway)")]
    pub group: String,
    #[arg(long, default_value = "")]
    pub norm: String,
    #[arg(long, default_value = "")]
    pub material: String,
    #[arg(long, default_value_t = 0.0)]
    pub width: f64,
    #[arg(long, default_value_t = 0.0)]
    pub height: f64,
    #[arg(long, default_value_t = 0.0)]
    pub depth: f64,
    #[arg(long, default_value = "none")]
    pub bore: String,
    #[arg(long, default_value_t = 0)]
    pub bores: u32,
    #[arg(long, default_value = "none")]
    pub coating: String,
    #[arg(long, default_value = "none")]
    pub hardening: String,
    #[arg(long, default_value = "none")]
    pub tolerance_width: String,
    #[arg(long, default_value = "none")]
    pub tolerance_height: String,
    #[arg(long, default_value_t = 1)]
    pub quantity: u32,
}

impl PartArgs {
    async fn configuration(&self) -> Result<Configuration> {
        if let Some(path) = &self.json {
            let raw = read_input(path).await?;
            return serde_json::from_str(&raw).context("Invalid configuration JSON");
        }
        Ok(Configuration {
            product_group: self.group.clone(),
            din_norm: self.norm.clone(),
            material: self.material.clone(),
            width: self.width,
            height: self.height,
            depth: self.depth,
            bore: self.bore.clone(),
            number_of_bores: self.bores,
            coating: self.coating.clone(),
            hardening: self.hardening.clone(),
            tolerance_width: self.tolerance_width.clone(),
            tolerance_height: self.tolerance_height.clone(),
            quantity: self.quantity.max(1),
        })
    }
}

async fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            raw.push_str(&line);
            raw.push('\n');
        }
        return Ok(raw);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn print_breakdown(config: &Configuration, breakdown: &PriceBreakdown) {
    println!(
        "{} {} {} x{}",
        config.product_group,
        config.material,
        config.dimensions_label(),
        breakdown.quantity
    );
    println!("  strategy    {}", breakdown.strategy);
    println!("  weight      {} g", breakdown.weight);
    if breakdown.base_price > 0.0 {
        println!("  base price  {}", format_eur(breakdown.base_price));
    }
    for cost in &breakdown.costs {
        println!(
            "  {:<11} {:<10} {} x {} = {}",
            cost.axis.to_string(),
            cost.option,
            cost.unit_cost,
            cost.multiplier,
            format_eur(cost.amount)
        );
    }
    if breakdown.discount_rate > 0.0 {
        println!(
            "  discount    {:.0}% (-{})",
            breakdown.discount_rate * 100.0,
            format_eur(breakdown.discount_amount())
        );
    }
    println!("  unit price  {}", format_eur(breakdown.unit_price));
    println!("  line total  {}", format_eur(breakdown.line_total));
    if breakdown.is_degraded() {
        println!("Failed to calculate price:");
        for warning in &breakdown.warnings {
            println!("  ! {warning}");
        }
    }
}

fn finish_quote(
    settings: &Settings,
    cart: &Cart,
    output: &QuoteArgs,
    header: Option<&DocumentHeader>,
) {
    print!("{}", cart.render());
    if !output.save {
        return;
    }
    let rfq = output
        .rfq
        .clone()
        .or_else(|| header.and_then(|h| h.rfq_number()).map(str::to_string));
    let customer = output
        .customer
        .clone()
        .or_else(|| header.and_then(|h| h.customer()).map(str::to_string));
    match settings.quote_store().save(cart, rfq, customer) {
        Ok(quote) => println!("Saved quote of {} ({} items)", format_eur(quote.total), quote.item_count),
        Err(e) => println!("Failed to save quote: {e}"),
    }
}

async fn run_chat(
    settings: &Settings,
    engine: PriceEngine,
    resolver: OptionResolver,
    client: ChatClient,
    message: Option<String>,
) -> Result<()> {
    let mut draft = Configuration::default();

    if let Some(message) = message {
        chat_turn(&client, &engine, &resolver, &message, &mut draft).await;
        return Ok(());
    }

    info!(
        "Chat session {} started, webhook {}",
        client.session_id(),
        settings.chat.webhook_url
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        chat_turn(&client, &engine, &resolver, line, &mut draft).await;
    }
    Ok(())
}

/// Sends one message; form-fill replies update and re-price the draft part.
async fn chat_turn(
    client: &ChatClient,
    engine: &PriceEngine,
    resolver: &OptionResolver,
    input: &str,
    draft: &mut Configuration,
) {
    match client.send(input).await {
        Ok(reply) => {
            show_reply(&reply);
            if reply.has_form_fill() {
                reply.apply_to(draft);
                resolver.resolve_configuration(draft).await;
                print_breakdown(draft, &engine.quote(draft).await);
            }
        }
        Err(e) => {
            warn!("Error sending message: {e}");
            println!("Connection error. Please try again.");
        }
    }
}

fn show_reply(reply: &ChatReply) {
    println!("{}", reply.text);
    if !reply.quick_replies.is_empty() {
        let buttons: Vec<String> = reply.quick_replies.iter().map(|b| format!("[{b}]")).collect();
        println!("{}", buttons.join(" "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let settings = Settings::load(&args.config)?;
    let http = settings.http_client()?;

    match args.command {
        Command::Price {
            part,
            strategy,
            json_output,
        } => {
            let engine = settings.price_engine(&http, strategy)?;
            let mut config = part.configuration().await?;
            settings
                .option_resolver(&http)
                .resolve_configuration(&mut config)
                .await;
            let breakdown = engine.quote(&config).await;
            if json_output {
                println!("{}", serde_json::to_string(&breakdown.response())?);
            } else {
                print_breakdown(&config, &breakdown);
            }
        }
        Command::Weight {
            width,
            height,
            depth,
            material,
            unit,
        } => {
            let engine = settings.price_engine(&http, None)?;
            let config = Configuration {
                material,
                width,
                height,
                depth,
                ..Default::default()
            };
            let grams = engine.weight(&config);
            println!("{} {unit}", convert_mass(grams, &MassUnit::G, &unit));
        }
        Command::Options { group } => {
            let options = settings.option_resolver(&http).options_for(group).await;
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
        Command::Groups => {
            for group in settings.option_resolver(&http).product_groups().await {
                println!("{:>3}  {}", group.id, group.name);
            }
        }
        Command::Quote { items, output } => {
            let raw = read_input(&items).await?;
            let configs: Vec<Configuration> =
                serde_json::from_str(&raw).context("Expected a JSON array of configurations")?;
            let resolver = settings.option_resolver(&http);
            let mut cart = Cart::new(settings.price_engine(&http, output.strategy)?);
            for mut config in configs {
                resolver.resolve_configuration(&mut config).await;
                cart.add_item(config).await;
            }
            finish_quote(&settings, &cart, &output, None);
        }
        Command::Ingest {
            file,
            paste,
            output,
        } => {
            let (header, items) = match (&paste, &file) {
                (Some(path), _) => (None, parse_pasted_items(&read_input(path).await?)?),
                (None, Some(path)) => {
                    let client = match DocumentClient::new(
                        http.clone(),
                        &settings.ingest.webhook_url,
                        settings.http.retries,
                    ) {
                        Ok(client) => client,
                        Err(IngestError::MissingWebhook) => {
                            println!("{MISSING_WEBHOOK_NOTICE}");
                            return Ok(());
                        }
                        Err(e) => return Err(e.into()),
                    };
                    match client.upload(path).await {
                        Ok(document) => (Some(document.header), document.items),
                        Err(e) => {
                            println!("Error: {e}");
                            return Ok(());
                        }
                    }
                }
                (None, None) => return Ok(()),
            };

            let mapper = ItemMapper::new(settings.cost_table()?)?;
            let mut cart = Cart::new(settings.price_engine(&http, output.strategy)?);
            quote_items(&mut cart, &mapper, &items).await;
            if let Some(header) = &header {
                println!(
                    "{} {} from {} ({})",
                    header.type_of_document, header.order_or_rfq_number, header.customer_name, header.date
                );
            }
            finish_quote(&settings, &cart, &output, header.as_ref());
        }
        Command::Chat { message, strategy } => {
            let client = match ChatClient::new(
                http.clone(),
                &settings.chat.webhook_url,
                settings.http.retries,
            ) {
                Ok(client) => client,
                Err(ChatError::MissingWebhook) => {
                    println!("{MISSING_WEBHOOK_NOTICE}");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let engine = settings.price_engine(&http, strategy)?;
            let resolver = settings.option_resolver(&http);
            run_chat(&settings, engine, resolver, client, message).await?;
        }
        Command::Quotes => {
            let store = settings.quote_store();
            let quotes = store.list()?;
            if quotes.is_empty() {
                println!("No saved quotes in {}", store.path().display());
            }
            for quote in quotes {
                println!(
                    "{}  {:>3} items  {:>14}  {}  {}",
                    quote.date.format("%Y-%m-%d %H:%M"),
                    quote.item_count,
                    format_eur(quote.total),
                    quote.rfq_number.as_deref().unwrap_or("-"),
                    quote.customer.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

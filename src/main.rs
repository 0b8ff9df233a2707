use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use shopdesk::application::dashboard::Dashboard;
use shopdesk::application::media_selector::{MediaSelector, SelectionMode};
use shopdesk::application::session::{CartItem, Session};
use shopdesk::application::settlement::SettlementService;
use shopdesk::application::settlement_desk::SettlementDesk;
use shopdesk::domain::bank_account::{AccountKind, NewBankAccount};
use shopdesk::domain::media::MediaUpload;
use shopdesk::domain::money::Money;
use shopdesk::domain::order::{OrderLineQuery, SettledFilter};
use shopdesk::domain::ports::{BankAccountDirectory, OrderBook};
use shopdesk::domain::settlement::{CompensationPolicy, MISSING_ORDER_INFO, group_selected_rows};
use shopdesk::domain::shop::ShopQuery;
use shopdesk::infrastructure::session_file::SessionFile;
use shopdesk::interfaces::csv::{OrderLineReader, ReportWriter};
use shopdesk::{ClientConfig, FetchScope, RestClient, ShopError};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Seller back-office for the shop backend", long_about = None)]
struct Cli {
    /// Base URL of the REST backend
    #[arg(long, global = true, env = "SHOPDESK_API_URL")]
    api_url: Option<String>,

    /// Where the session (token, user id, cart) is stored
    #[arg(long, global = true, env = "SHOPDESK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a bearer token and user id in the session
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        user_id: Option<u64>,
    },
    /// Forget the stored token and user id
    Logout,
    /// Show who the session belongs to
    Whoami,
    /// List shops
    Shops {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        search: Option<String>,
        /// Only shops owned by the session user
        #[arg(long)]
        mine: bool,
    },
    /// Show one shop
    Shop { id: u64 },
    /// Print the seller's order lines as CSV
    Orders {
        #[arg(long)]
        shop: Option<u64>,
        #[arg(long, value_enum, default_value_t = SettledArg::All)]
        settled: SettledArg,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Manage payout accounts
    Accounts {
        #[command(subcommand)]
        command: AccountsCommand,
    },
    /// Settle selected order lines, one request per order
    Settle {
        /// Payout account id
        #[arg(long)]
        account: Option<u64>,
        /// Seller id, defaults to the session user
        #[arg(long)]
        seller: Option<String>,
        /// Read the selected rows from a CSV file instead of the backend
        #[arg(long)]
        rows: Option<PathBuf>,
        /// Load unsettled lines of this shop
        #[arg(long)]
        shop: Option<u64>,
        /// Row ids to select; all loaded rows when omitted
        #[arg(long, value_delimiter = ',')]
        lines: Vec<u64>,
        /// Print the settlement plan as CSV without sending anything
        #[arg(long)]
        dry_run: bool,
        /// Reverse committed orders when a later one fails
        #[arg(long)]
        compensate: bool,
    },
    /// Print the transaction report as CSV
    Transactions {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Seller metrics and per-shop sales
    Dashboard,
    /// Browse and upload media
    Media {
        #[command(subcommand)]
        command: MediaCommand,
    },
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        command: CartCommand,
    },
}

#[derive(Subcommand)]
enum AccountsCommand {
    List,
    Add {
        #[arg(long = "type", value_enum, default_value_t = KindArg::Bank)]
        kind: KindArg,
        #[arg(long)]
        account_name: String,
        #[arg(long)]
        account_no: String,
        #[arg(long)]
        bank_name: Option<String>,
        #[arg(long)]
        route: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum MediaCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Upload { file: PathBuf },
}

#[derive(Subcommand)]
enum CartCommand {
    List,
    Add {
        #[arg(long)]
        product: u64,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 1)]
        qty: u32,
        #[arg(long)]
        price: rust_decimal::Decimal,
    },
    Remove {
        #[arg(long)]
        product: u64,
    },
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum SettledArg {
    All,
    Settled,
    Unsettled,
}

impl From<SettledArg> for SettledFilter {
    fn from(arg: SettledArg) -> Self {
        match arg {
            SettledArg::All => SettledFilter::All,
            SettledArg::Settled => SettledFilter::Settled,
            SettledArg::Unsettled => SettledFilter::Unsettled,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Bank,
    Mfs,
}

struct Context {
    session: Arc<Session>,
    client: RestClient,
    scope: FetchScope,
}

impl Context {
    fn new(cli: &Cli) -> shopdesk::Result<Self> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &cli.api_url {
            config.api_url = url.clone();
        }
        if let Some(path) = &cli.session_file {
            config.session_file = path.clone();
        }
        let session = Arc::new(Session::load(SessionFile::new(&config.session_file))?);
        let client = RestClient::new(&config, session.clone())?;

        let scope = FetchScope::new();
        let on_interrupt = scope.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        Ok(Self {
            session,
            client,
            scope,
        })
    }

    fn seller(&self, seller: Option<String>) -> String {
        seller
            .or_else(|| self.session.user_id().map(|id| id.to_string()))
            .unwrap_or_default()
    }

    fn dashboard(&self) -> Dashboard {
        Dashboard::new(
            Box::new(self.client.clone()),
            Box::new(self.client.clone()),
            Box::new(self.client.clone()),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    shopdesk::logging::setup_tracing();
    let cli = Cli::parse();
    let ctx = Context::new(&cli).into_diagnostic()?;
    run(cli.command, &ctx).await.into_diagnostic()
}

async fn run(command: Command, ctx: &Context) -> shopdesk::Result<()> {
    let scope = &ctx.scope;
    match command {
        Command::Login { token, user_id } => {
            ctx.session.login(token, user_id)?;
            println!("Logged in");
        }
        Command::Logout => {
            ctx.session.logout()?;
            println!("Logged out");
        }
        Command::Whoami => {
            let state = ctx.session.snapshot();
            match (state.user_id, state.token.is_some()) {
                (Some(id), true) => println!("user {id}"),
                (None, true) => println!("logged in, no user id"),
                (_, false) => println!("not logged in"),
            }
            println!("cart items: {}", state.cart.len());
        }
        Command::Shops { page, search, mine } => {
            let user_id = if mine {
                Some(ctx.session.require_user()?)
            } else {
                None
            };
            let query = ShopQuery {
                page,
                search,
                user_id,
            };
            let shops = ctx.dashboard().shops(&query, scope).await?;
            for shop in &shops.data {
                let state = if shop.is_active { "active" } else { "inactive" };
                println!("{}\t{}\t{state}", shop.id, shop.name);
            }
            println!("page {}/{}", shops.current_page, shops.last_page);
        }
        Command::Shop { id } => {
            let shop = ctx.dashboard().shop(id, scope).await?;
            println!("{}", serde_json::to_string_pretty(&shop)?);
        }
        Command::Orders {
            shop,
            settled,
            page,
        } => {
            let user_id = ctx.session.require_user()?;
            let query = OrderLineQuery {
                shop_id: shop,
                page,
                settled: settled.into(),
            };
            let lines = scope
                .run(ctx.client.shop_order_lines(user_id, &query))
                .await?;
            ReportWriter::new(io::stdout().lock()).write_order_lines(&lines.data)?;
        }
        Command::Accounts { command } => run_accounts(command, ctx).await?,
        Command::Settle {
            account,
            seller,
            rows,
            shop,
            lines,
            dry_run,
            compensate,
        } => {
            let policy = if compensate {
                CompensationPolicy::Reverse
            } else {
                CompensationPolicy::None
            };
            let desk = SettlementDesk::new(
                ctx.seller(seller),
                Box::new(ctx.client.clone()),
                Box::new(ctx.client.clone()),
                SettlementService::new(Box::new(ctx.client.clone())).with_policy(policy),
            );

            match rows {
                Some(path) => desk.set_rows(OrderLineReader::new(File::open(path)?).read_all()?),
                None => {
                    desk.load_rows(shop, scope).await?;
                }
            }
            if lines.is_empty() {
                desk.select_all();
            } else {
                for id in lines {
                    if !desk.toggle_row(id) {
                        eprintln!("Row {id} is not among the loaded rows, skipped");
                    }
                }
            }

            if dry_run {
                let selected = desk.selected_rows();
                let plan = group_selected_rows(&selected)?;
                if plan.is_empty() {
                    return Err(ShopError::validation(MISSING_ORDER_INFO));
                }
                ReportWriter::new(io::stdout().lock()).write_plan(&plan)?;
                if plan.dropped > 0 {
                    eprintln!("{} row(s) without an order id left out", plan.dropped);
                }
                return Ok(());
            }

            let account =
                account.ok_or_else(|| ShopError::validation("Please select a bank account."))?;
            desk.load_accounts(scope).await?;
            desk.select_account(account)?;
            match desk.settle(scope).await {
                Ok(receipt) => {
                    println!("{} Total {}.", receipt.message, receipt.total);
                    if receipt.dropped_rows > 0 {
                        eprintln!(
                            "{} row(s) without an order id left out",
                            receipt.dropped_rows
                        );
                    }
                }
                Err(ShopError::Settlement(failure)) => {
                    eprintln!("Settlement stopped at order {}", failure.failed_order);
                    eprintln!("  committed:     {:?}", failure.committed);
                    eprintln!("  reversed:      {:?}", failure.compensated);
                    eprintln!("  still settled: {:?}", failure.uncompensated);
                    eprintln!("  not sent:      {:?}", failure.skipped);
                    return Err(ShopError::Settlement(failure));
                }
                Err(e) => return Err(e),
            }
        }
        Command::Transactions { page } => {
            let user_id = ctx.session.require_user()?;
            let entries = ctx.dashboard().transactions(user_id, page, scope).await?;
            ReportWriter::new(io::stdout().lock()).write_ledger(&entries.data)?;
        }
        Command::Dashboard => {
            let user_id = ctx.session.require_user()?;
            let view = ctx.dashboard().load(user_id, scope).await?;
            let report = &view.report;
            println!("shops:      {}", report.total_shops);
            println!("products:   {}", report.total_products);
            println!("orders:     {}", report.total_orders);
            println!("sales:      {}", report.total_sales);
            println!("settled:    {}", report.settled_amount);
            println!("unsettled:  {}", report.unsettled_amount);
            for summary in &view.shops {
                println!(
                    "{}\t{}\torders {}\tsales {}",
                    summary.shop.id,
                    summary.shop.name,
                    summary.sales.total_orders,
                    summary.sales.total_sales
                );
            }
        }
        Command::Media { command } => {
            let mut selector =
                MediaSelector::new(Box::new(ctx.client.clone()), SelectionMode::Single);
            match command {
                MediaCommand::List { page } => {
                    selector.load_page(page, scope).await?;
                }
                MediaCommand::Upload { file } => {
                    selector.set_upload(MediaUpload::from_path(file).await?);
                    let item = selector.upload(scope).await?;
                    println!("Uploaded #{} {}", item.id, item.url);
                }
            }
            for item in selector.items() {
                println!("{}\t{}", item.id, item.url);
            }
            let page = selector.page();
            println!("page {}/{}", page.current_page, page.last_page);
        }
        Command::Cart { command } => {
            match command {
                CartCommand::List => {}
                CartCommand::Add {
                    product,
                    name,
                    qty,
                    price,
                } => ctx.session.add_to_cart(CartItem {
                    product_id: product,
                    name,
                    qty,
                    unit_price: Money::new(price),
                })?,
                CartCommand::Remove { product } => ctx.session.remove_from_cart(product)?,
                CartCommand::Clear => ctx.session.clear_cart()?,
            }
            for item in ctx.session.cart() {
                println!(
                    "{}\t{}\tx{}\t{}",
                    item.product_id,
                    item.name,
                    item.qty,
                    item.line_total()?
                );
            }
            println!("total: {}", ctx.session.cart_total()?);
        }
    }
    Ok(())
}

async fn run_accounts(command: AccountsCommand, ctx: &Context) -> shopdesk::Result<()> {
    let user_id = ctx.session.require_user()?;
    match command {
        AccountsCommand::List => {
            let accounts = ctx
                .scope
                .run(ctx.client.accounts_for_user(user_id))
                .await?;
            for account in &accounts {
                println!("{}", account.label());
            }
        }
        AccountsCommand::Add {
            kind,
            account_name,
            account_no,
            bank_name,
            route,
            address,
        } => {
            let new = NewBankAccount {
                user_id,
                kind: match kind {
                    KindArg::Bank => AccountKind::Bank,
                    KindArg::Mfs => AccountKind::Mfs,
                },
                bank_name,
                account_name,
                account_no,
                route,
                address,
            };
            new.validate()?;
            let created = ctx.scope.run(ctx.client.add_account(&new)).await?;
            println!("Added {}", created.label());
        }
    }
    Ok(())
}

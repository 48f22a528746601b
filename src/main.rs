use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use rent_desk::{
    ApiClient, AppConfig, FileStorage, Landing, MonthGrid, Role, SystemClock, Upload,
    bidding::{self, SuggestedRange},
    calendar,
    export,
    models::{Amenity, Frequency, Installments, NewBid, PropertyDetails, Pricing, TourStatus},
    roles,
    traits::Clock,
    wizard::{
        AddPropertyWizard, BookingWizard, PaymentPlan, PaymentWizard, PropertyDraft, StepOutcome,
    },
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "rent-desk")]
#[command(about = "Rental marketplace client - listings, tours, bids and payments")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sign-in URL
    Login {
        /// Use UAE Pass instead of the hosted Cognito page
        #[arg(long)]
        uae_pass: bool,
        /// Role to assign right after the first sign-in
        #[arg(long = "as", value_parser = parse_role)]
        role: Option<Role>,
    },
    /// Clear local session flags and print the sign-out URL
    Logout {
        #[arg(long)]
        uae_pass: bool,
    },
    /// Show the signed-in profile
    Whoami,
    /// Work out which dashboard to open
    Landing,
    /// Assign a role to the signed-in account
    ChooseRole {
        #[arg(value_parser = parse_role)]
        role: Role,
    },
    /// Landlord listings
    Listings {
        /// Only drafts left part-way through submission
        #[arg(long)]
        incomplete: bool,
    },
    /// Submit a new listing from a JSON draft file
    AddProperty {
        draft: PathBuf,
        /// Continue an incomplete listing instead of verifying a new permit
        #[arg(long)]
        resume: Option<String>,
    },
    #[command(subcommand)]
    Tours(TourCommand),
    #[command(subcommand)]
    Bids(BidCommand),
    /// Start a rent payment and print the gateway hand-off
    Pay {
        listing_id: String,
        annual_rent: f64,
        #[arg(long, value_parser = parse_wire::<Frequency>, default_value = "quarterly")]
        frequency: Frequency,
        #[arg(long, value_parser = parse_installments, default_value = "4")]
        installments: Installments,
        /// First cheque date (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Bid thread whose agreed terms are being paid
        #[arg(long)]
        bid: Option<String>,
    },
    /// Print a month of the booking calendar
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        /// 1-12
        #[arg(long)]
        month: Option<u32>,
        /// Mark days with scheduled tours (needs a session)
        #[arg(long)]
        with_tours: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TourCommand {
    List {
        #[arg(long, value_parser = parse_wire::<TourStatus>)]
        status: Option<TourStatus>,
    },
    Show {
        tour_id: String,
    },
    Availability {
        listing_id: String,
        date: NaiveDate,
    },
    Book {
        listing_id: String,
        date: NaiveDate,
        time_slot: String,
    },
    Cancel {
        tour_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    Reschedule {
        tour_id: String,
        date: NaiveDate,
        time_slot: String,
    },
}

#[derive(Subcommand, Debug)]
enum BidCommand {
    List {
        /// Bids received on your listings (landlord)
        #[arg(long)]
        received: bool,
    },
    History {
        bid_thread_id: String,
        /// Export to CSV; without a path, into the download folder
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        csv: Option<String>,
    },
    /// Score an offer without sending it
    Strength {
        amount: f64,
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
    },
    Place {
        listing_id: String,
        amount: f64,
        #[arg(long, value_parser = parse_wire::<Frequency>, default_value = "quarterly")]
        frequency: Frequency,
        #[arg(long, value_parser = parse_installments, default_value = "4")]
        installments: Installments,
    },
    Withdraw {
        bid_thread_id: String,
    },
    Counter {
        bid_thread_id: String,
        amount: f64,
    },
    Accept {
        bid_thread_id: String,
    },
    Reject {
        bid_thread_id: String,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse()
}

/// Parse a value by its wire spelling, case-insensitively.
fn parse_wire<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    let wire = s.trim().replace('-', "_").to_uppercase();
    serde_json::from_value(serde_json::Value::String(wire)).map_err(|e| e.to_string())
}

fn parse_installments(s: &str) -> Result<Installments, String> {
    let n: u8 = s.trim().parse().map_err(|_| format!("not a number: {s}"))?;
    Installments::try_from(n)
}

/// On-disk shape of an add-property draft. File paths are resolved relative
/// to the draft file.
#[derive(Debug, Deserialize)]
struct DraftManifest {
    permit_number: String,
    title_deed: Option<PathBuf>,
    emirates_id: Option<PathBuf>,
    details: PropertyDetails,
    #[serde(default)]
    images: Vec<PathBuf>,
    pricing: Pricing,
    #[serde(default)]
    amenities: BTreeSet<Amenity>,
    description: String,
}

impl DraftManifest {
    async fn into_draft(self, base: &Path) -> Result<PropertyDraft> {
        async fn load(base: &Path, path: &Path) -> Result<Upload> {
            let full = base.join(path);
            Upload::from_path(&full)
                .await
                .with_context(|| format!("Failed to read {}", full.display()))
        }

        let title_deed = match &self.title_deed {
            Some(p) => Some(load(base, p).await?),
            None => None,
        };
        let emirates_id = match &self.emirates_id {
            Some(p) => Some(load(base, p).await?),
            None => None,
        };
        let mut images = Vec::with_capacity(self.images.len());
        for p in &self.images {
            images.push(load(base, p).await?);
        }

        Ok(PropertyDraft {
            permit_number: self.permit_number,
            title_deed,
            emirates_id,
            details: self.details,
            images,
            pricing: self.pricing,
            amenities: self.amenities,
            description: self.description,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy("rent_desk=debug");

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(run(args.command, config))
}

async fn run(command: Command, config: AppConfig) -> Result<()> {
    let storage = FileStorage::open(&config.storage.session_file)?;
    let client = ApiClient::from_config(&config)
        .context("Failed to create API client")?
        .with_storage(Arc::new(storage));
    tracing::debug!(base_url = client.base_url(), "API client initialized");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match command {
        Command::Login { uae_pass, role } => {
            if let Some(role) = role {
                roles::remember_pending_role(client.storage(), role)?;
                tracing::info!(%role, "Role will be assigned after sign-in");
            }
            let url = if uae_pass {
                client.uae_pass_login_url()
            } else {
                client.login_url()
            };
            println!("{url}");
        }
        Command::Logout { uae_pass } => {
            let url = client.logout();
            println!("{}", if uae_pass { client.uae_pass_logout_url() } else { url });
        }
        Command::Whoami => {
            let profile = client.profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Landing => print_landing(&roles::resolve_landing(&client).await?),
        Command::ChooseRole { role } => {
            print_landing(&roles::choose_role(&client, role).await?);
        }
        Command::Listings { incomplete } => {
            let listings = if incomplete {
                client.incomplete_listings().await?
            } else {
                client.list_listings().await?
            };
            for l in &listings {
                println!(
                    "{:<10} {:<22} {:>12} {}",
                    l.id,
                    format!("{:?}", l.status),
                    l.price.map(|p| format!("{p:.0}")).unwrap_or_default(),
                    l.location.as_deref().unwrap_or("")
                );
            }
            println!("{} listing(s)", listings.len());
        }
        Command::AddProperty { draft, resume } => {
            add_property(client, &draft, resume).await?;
        }
        Command::Tours(cmd) => tours(&client, clock, cmd).await?,
        Command::Bids(cmd) => bids(&client, &config, cmd).await?,
        Command::Pay {
            listing_id,
            annual_rent,
            frequency,
            installments,
            start,
            bid,
        } => {
            let start = start.unwrap_or_else(|| clock.today());
            let mut wizard = PaymentWizard::new(client, listing_id, annual_rent, start);
            if let Some(bid) = bid {
                wizard = wizard.for_bid(bid);
            }

            let schedule = wizard.choose_plan(PaymentPlan {
                frequency,
                installments,
            })?;
            for i in schedule {
                println!("#{:<2} {}  {:>12.2}", i.number, i.due_date, i.amount());
            }

            let form = wizard.submit().await?;
            println!("POST {}", form.action_url);
            for (k, v) in &form.fields {
                println!("  {k}={v}");
            }
        }
        Command::Calendar {
            year,
            month,
            with_tours,
        } => {
            let today = clock.today();
            let grid = MonthGrid::new(
                year.unwrap_or(today.year()),
                month.unwrap_or(today.month()),
                today,
            )?;
            let grid = if with_tours {
                let booked: BTreeSet<NaiveDate> = client
                    .list_tours(Some(TourStatus::Scheduled))
                    .await?
                    .into_iter()
                    .map(|t| t.date)
                    .collect();
                grid.with_marked(&booked)
            } else {
                grid
            };
            print!("{}", grid.render());
            let (py, pm) = calendar::previous_month(grid.year, grid.month);
            let (ny, nm) = calendar::next_month(grid.year, grid.month);
            println!("prev: --year {py} --month {pm}   next: --year {ny} --month {nm}");
            if config.google.client_id.is_none() {
                tracing::debug!("Google calendar sync not configured");
            }
        }
    }

    Ok(())
}

fn print_landing(landing: &Landing) {
    match landing {
        Landing::SignIn(url) => println!("Not signed in. Open: {url}"),
        Landing::Redirect(path) => println!("{path}"),
        Landing::SelectRole => {
            println!("No role assigned yet. Choose one of:");
            for role in Role::ALL {
                println!("  {} ({})", role, role.id());
            }
        }
    }
}

async fn add_property(client: ApiClient, draft_path: &Path, resume: Option<String>) -> Result<()> {
    let raw = tokio::fs::read_to_string(draft_path)
        .await
        .with_context(|| format!("Failed to read {}", draft_path.display()))?;
    let manifest: DraftManifest = serde_json::from_str(&raw).context("Invalid draft file")?;
    let base = draft_path.parent().unwrap_or(Path::new("."));
    let draft = manifest.into_draft(base).await?;

    let mut wizard = match resume {
        Some(listing_id) => AddPropertyWizard::resume(client, listing_id, draft),
        None => AddPropertyWizard::with_draft(client, draft),
    };

    loop {
        let step = wizard.step();
        println!("[{}/7] {}", step.number(), step.title());
        match wizard
            .next()
            .await
            .with_context(|| format!("Step {} failed", step.number()))?
        {
            StepOutcome::Advanced(_) => {}
            StepOutcome::Published(listing) => {
                println!("Published listing {} ({:?})", listing.id, listing.status);
                return Ok(());
            }
        }
    }
}

async fn tours(client: &ApiClient, clock: Arc<dyn Clock>, cmd: TourCommand) -> Result<()> {
    match cmd {
        TourCommand::List { status } => {
            for t in client.list_tours(status).await? {
                println!(
                    "{:<10} {} {:<6} {:?} listing {}",
                    t.id, t.date, t.time_slot, t.status, t.listing_id
                );
            }
        }
        TourCommand::Show { tour_id } => {
            let t = client.tour(&tour_id).await?;
            println!("{t:#?}");
        }
        TourCommand::Availability { listing_id, date } => {
            for slot in client.tour_availability(&listing_id, date).await? {
                let mark = if slot.available { "free" } else { "taken" };
                println!("{} {mark}", slot.time_slot);
            }
        }
        TourCommand::Book {
            listing_id,
            date,
            time_slot,
        } => {
            let mut wizard = BookingWizard::new(client.clone(), clock, listing_id);
            wizard.select_date(date).await?;
            wizard.select_slot(&time_slot)?;
            let tour = wizard.confirm().await?;
            println!("Booked tour {} on {} at {}", tour.id, tour.date, tour.time_slot);
        }
        TourCommand::Cancel { tour_id, reason } => {
            let t = client.cancel_tour(&tour_id, reason.as_deref()).await?;
            println!("Tour {} is now {:?}", t.id, t.status);
        }
        TourCommand::Reschedule {
            tour_id,
            date,
            time_slot,
        } => {
            if !calendar::is_selectable(date, clock.today()) {
                anyhow::bail!("{date} is in the past");
            }
            let t = client.reschedule_tour(&tour_id, date, &time_slot).await?;
            println!("Tour {} moved to {} at {}", t.id, t.date, t.time_slot);
        }
    }
    Ok(())
}

async fn bids(client: &ApiClient, config: &AppConfig, cmd: BidCommand) -> Result<()> {
    match cmd {
        BidCommand::List { received } => {
            let bids = if received {
                client.received_bids().await?
            } else {
                client.list_bids().await?
            };
            for b in bids {
                println!(
                    "{:<10} listing {:<8} {:>12.0} {:?} x{} {:?}",
                    b.bid_thread_id,
                    b.listing_id,
                    b.amount,
                    b.frequency,
                    b.installments.count(),
                    b.status
                );
            }
        }
        BidCommand::History { bid_thread_id, csv } => {
            let history = client.bid_history(&bid_thread_id).await?;
            match csv {
                Some(path) => {
                    let path = if path.is_empty() {
                        export::default_export_path(&bid_thread_id, chrono::Utc::now())
                    } else {
                        PathBuf::from(path)
                    };
                    let out = path.clone();
                    let id = bid_thread_id.clone();
                    let rows = tokio::task::spawn_blocking(move || {
                        export::write_bid_history(&out, &id, &history)
                    })
                    .await
                    .context("Export task failed")??;
                    println!("Saved {rows} row(s) to {}", path.display());
                }
                None => {
                    for h in history {
                        println!(
                            "{} {:?} {:?} {:.0} {}",
                            h.created_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
                            h.party,
                            h.status,
                            h.amount,
                            h.note.unwrap_or_default()
                        );
                    }
                }
            }
        }
        BidCommand::Strength { amount, min, max } => {
            let range = SuggestedRange::new(min, max)?;
            let strength =
                bidding::score_bid_with_margin(amount, range, config.bidding.weak_margin)?;
            println!(
                "{} ({:.1}%, {:?})",
                strength.label, strength.percentage, strength.band
            );
        }
        BidCommand::Place {
            listing_id,
            amount,
            frequency,
            installments,
        } => {
            let suggestion = client
                .bid_suggestions(&listing_id)
                .await
                .inspect_err(|e| tracing::warn!("Bid suggestions unavailable: {e}"))
                .ok();
            let check = bidding::check_offer(
                amount,
                suggestion.as_ref(),
                config.bidding.max_offers_per_listing,
                config.bidding.weak_margin,
            )?;
            if let Some(strength) = check.strength {
                println!(
                    "Offer strength: {} ({:.1}%)",
                    strength.label, strength.percentage
                );
            }
            if let Some(left) = check.offers_left {
                println!("Offers left including this one: {left}");
            }

            let bid = client
                .place_bid(&NewBid {
                    listing_id,
                    amount,
                    frequency,
                    installments,
                })
                .await?;
            println!("Placed bid {} ({:?})", bid.bid_thread_id, bid.status);
        }
        BidCommand::Withdraw { bid_thread_id } => {
            client.withdraw_bid(&bid_thread_id).await?;
            println!("Withdrawn {bid_thread_id}");
        }
        BidCommand::Counter {
            bid_thread_id,
            amount,
        } => {
            let bid = client.counter_bid(&bid_thread_id, amount).await?;
            println!("Countered at {:.0} ({:?})", bid.amount, bid.status);
        }
        BidCommand::Accept { bid_thread_id } => {
            let bid = client.accept_bid(&bid_thread_id).await?;
            println!("Bid {} {:?}", bid.bid_thread_id, bid.status);
        }
        BidCommand::Reject { bid_thread_id } => {
            let bid = client.reject_bid(&bid_thread_id).await?;
            println!("Bid {} {:?}", bid.bid_thread_id, bid.status);
        }
    }
    Ok(())
}

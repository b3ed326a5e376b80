//! Decor CLI
//!
//! Command-line interface for the booking marketplace API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use decor_client::DecorClient;
use decor_types::{
    BookingId, BookingQuery, CreateCheckoutSessionRequest, DeliveryStatus, ListingId,
    ListingQuery, UserRole,
};

#[derive(Parser)]
#[command(name = "decor")]
#[command(author, version, about = "Booking marketplace API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the marketplace API
    #[arg(long, env = "DECOR_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User operations
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Catalog operations
    Service {
        #[command(subcommand)]
        action: ServiceCommands,
    },
    /// Booking operations
    Booking {
        #[command(subcommand)]
        action: BookingCommands,
    },
    /// Payment operations
    Payment {
        #[command(subcommand)]
        action: PaymentCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register (or log in) a user
    Register {
        /// Login email
        email: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Role (user, decorator, admin, rider)
        #[arg(long)]
        role: Option<String>,
    },
    /// List all users
    List,
    /// Look up a user's role
    Role {
        /// Login email
        email: String,
    },
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// Publish a service listing
    Create {
        /// Service name
        name: String,
        #[arg(long)]
        category: String,
        /// Price in major currency units
        #[arg(long)]
        cost: f64,
    },
    /// Browse the catalog
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_budget: Option<f64>,
        #[arg(long)]
        max_budget: Option<f64>,
    },
    /// Get a listing by id
    Get {
        /// Listing ID (UUID)
        id: String,
    },
}

#[derive(Subcommand)]
enum BookingCommands {
    /// Place a booking
    Create {
        /// Customer email
        #[arg(long)]
        email: String,
    },
    /// List bookings
    List {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        decorator_email: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Assign a decorator to a booking
    Assign {
        /// Booking ID (UUID)
        #[arg(long)]
        booking: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Move a booking along its delivery lifecycle
    Status {
        /// Booking ID (UUID)
        #[arg(long)]
        booking: String,
        /// New delivery status
        status: String,
    },
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Open a hosted checkout session for a booking
    Checkout {
        /// Booking ID (UUID)
        #[arg(long)]
        booking: String,
        #[arg(long)]
        tracking_id: String,
        /// Price in major currency units
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        email: String,
        #[arg(long)]
        service_name: String,
    },
    /// Settle a completed checkout session
    Settle {
        /// Checkout session id
        session_id: String,
    },
    /// List the payment ledger
    List {
        #[arg(long)]
        email: Option<String>,
    },
}

fn parse_booking_id(s: &str) -> Result<BookingId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid booking ID: {}", s))
}

fn parse_listing_id(s: &str) -> Result<ListingId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid service ID: {}", s))
}

fn parse_role(s: &str) -> Result<UserRole> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

fn parse_status(s: &str) -> Result<DeliveryStatus> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = DecorClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::User { action } => match action {
            UserCommands::Register { email, name, role } => {
                let role = role.as_deref().map(parse_role).transpose()?;
                let user = client.register_user(&email, name, role).await?;
                println!("{}", serde_json::to_string_pretty(&user)?);
            }
            UserCommands::List => {
                let users = client.list_users().await?;
                println!("{}", serde_json::to_string_pretty(&users)?);
            }
            UserCommands::Role { email } => {
                let role = client.user_role(&email).await?;
                println!("{}", role);
            }
        },

        Commands::Service { action } => match action {
            ServiceCommands::Create {
                name,
                category,
                cost,
            } => {
                let listing = client.create_listing(&name, &category, cost).await?;
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
            ServiceCommands::List {
                search,
                category,
                min_budget,
                max_budget,
            } => {
                let filter = ListingQuery {
                    search,
                    category,
                    min_budget,
                    max_budget,
                };
                let listings = client.list_listings(&filter).await?;
                println!("{}", serde_json::to_string_pretty(&listings)?);
            }
            ServiceCommands::Get { id } => {
                let listing = client.get_listing(parse_listing_id(&id)?).await?;
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
        },

        Commands::Booking { action } => match action {
            BookingCommands::Create { email } => {
                let booking = client.create_booking(&email).await?;
                println!("{}", serde_json::to_string_pretty(&booking)?);
            }
            BookingCommands::List {
                email,
                decorator_email,
                status,
            } => {
                let filter = BookingQuery {
                    email,
                    decorator_email,
                    delivery_status: status.as_deref().map(parse_status).transpose()?,
                };
                let bookings = client.list_bookings(&filter).await?;
                println!("{}", serde_json::to_string_pretty(&bookings)?);
            }
            BookingCommands::Assign {
                booking,
                name,
                email,
            } => {
                let booking = client
                    .assign_decorator(parse_booking_id(&booking)?, &name, &email)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&booking)?);
            }
            BookingCommands::Status { booking, status } => {
                let booking = client
                    .update_delivery_status(parse_booking_id(&booking)?, parse_status(&status)?)
                    .await?;
                println!("{}", serde_json::to_string_pretty(&booking)?);
            }
        },

        Commands::Payment { action } => match action {
            PaymentCommands::Checkout {
                booking,
                tracking_id,
                cost,
                email,
                service_name,
            } => {
                let req = CreateCheckoutSessionRequest {
                    booking_id: parse_booking_id(&booking)?,
                    tracking_id,
                    cost,
                    email,
                    service_name,
                };
                let session = client.create_checkout_session(&req).await?;
                println!("{}", session.url);
            }
            PaymentCommands::Settle { session_id } => {
                let result = client.settle_payment(&session_id).await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            PaymentCommands::List { email } => {
                let payments = client.list_payments(email.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&payments)?);
            }
        },
    }

    Ok(())
}

//! Demo driving the full booking-and-payment flow against a running server.
//!
//! Run with: cargo run -p decor-app --example booking_demo

use std::net::SocketAddr;

use tempfile::tempdir;
use tokio::net::TcpListener;

use decor_checkout::SandboxCheckout;
use decor_client::DecorClient;
use decor_hex::{MarketplaceService, inbound::HttpServer};
use decor_repo::build_repo;
use decor_types::{BookingQuery, UserRole};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let port = addr.port();
    drop(listener);

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("decor.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("🚀 Starting server on port {port}...");
    println!("   Database: {db_url}");

    // Build repository (handles connection and migration)
    let repo = build_repo(&db_url).await?;

    // Keep a sandbox handle so the demo can "complete" the hosted flow
    let sandbox = SandboxCheckout::new();
    let service = MarketplaceService::new(repo, sandbox.clone());
    let router = HttpServer::new(service).router();

    let server_addr = format!("127.0.0.1:{port}");
    tokio::spawn(async move {
        axum::serve(
            TcpListener::bind(&server_addr).await.unwrap(),
            router.into_make_service(),
        )
        .await
        .unwrap();
    });

    // Wait for server to start
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    let base_url = format!("http://127.0.0.1:{port}");
    let client = DecorClient::new(&base_url);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: full booking flow
    // ─────────────────────────────────────────────────────────────────────────

    println!("\n📋 Registering customer and decorator...");
    let customer = client
        .register_user("alice@example.com", Some("Alice".into()), None)
        .await?;
    let decorator = client
        .register_user(
            "mina@example.com",
            Some("Mina".into()),
            Some(UserRole::Decorator),
        )
        .await?;
    println!("   customer:  {} ({})", customer.email, customer.role);
    println!(
        "   decorator: {} (status: {:?})",
        decorator.email, decorator.status
    );

    println!("\n🛒 Publishing a listing...");
    let listing = client
        .create_listing("Wedding stage decoration", "wedding", 450.0)
        .await?;
    println!("   {} - ${}", listing.service_name, listing.cost);

    println!("\n📅 Placing a booking...");
    let booking = client.create_booking(&customer.email).await?;
    println!(
        "   {} [{}] status: {}",
        booking.id, booking.tracking_id, booking.delivery_status
    );

    println!("\n👷 Assigning the decorator...");
    let booking = client
        .assign_decorator(booking.id, "Mina", &decorator.email)
        .await?;
    println!("   status: {}", booking.delivery_status);

    println!("\n💳 Opening a checkout session...");
    let session = client
        .create_checkout_session(&decor_types::CreateCheckoutSessionRequest {
            booking_id: booking.id,
            tracking_id: booking.tracking_id.to_string(),
            cost: listing.cost,
            email: customer.email.clone(),
            service_name: listing.service_name.clone(),
        })
        .await?;
    println!("   redirect: {}", session.url);

    // Simulate the customer completing the hosted flow
    let session_id = session.url.rsplit('/').next().unwrap().to_string();
    sandbox.mark_paid(&session_id).unwrap();
    println!("   (customer pays on the hosted page)");

    println!("\n✅ Settling the payment...");
    let settlement = client.settle_payment(&session_id).await?;
    println!(
        "   success: {}, transaction: {}",
        settlement.success, settlement.transaction_id
    );

    println!("\n🔁 Settling the same session again (idempotency check)...");
    let replay = client.settle_payment(&session_id).await?;
    println!(
        "   already settled: {}, tracking id: {:?}",
        replay.already_settled, replay.tracking_id
    );

    let bookings = client
        .list_bookings(&BookingQuery {
            email: Some(customer.email.clone()),
            ..Default::default()
        })
        .await?;
    println!("\n📦 Final booking state: {}", bookings[0].delivery_status);

    let payments = client.list_payments(Some(&customer.email)).await?;
    println!("💰 Ledger rows: {}", payments.len());

    Ok(())
}

//! # Seed Data Generator
//!
//! Populates a development database with staff users, a week of bookings
//! and some payment history.
//!
//! ## Usage
//! ```bash
//! # 40 bookings (default)
//! cargo run -p bloom-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p bloom-db --bin seed -- --count 200 --db ./data/bloom.db
//! ```
//!
//! Every third booking is fully paid (split cash/card), every third is
//! half paid in cash, the rest are unpaid. Each fifth paid booking gets a
//! partial refund so the ledger view has something to show.

use bloom_core::{BookingStatus, Money, NewBooking, User};
use bloom_db::migrations::migration_status;
use bloom_db::{Database, DbConfig};
use chrono::{Duration, Utc};
use std::env;

/// Staff accounts mirrored from the identity system.
const STAFF: &[(&str, &str, &str)] = &[
    ("staff-reception", "reception@bloom.local", "Front Desk"),
    ("staff-manager", "manager@bloom.local", "Salon Manager"),
];

/// Services with their price in cents.
const SERVICES: &[(&str, i64)] = &[
    ("Haircut", 3500),
    ("Haircut & Blow-dry", 5500),
    ("Color treatment", 12000),
    ("Manicure", 3000),
    ("Pedicure", 4000),
    ("Facial", 7500),
    ("Massage 60 min", 9000),
    ("Massage 90 min", 12500),
];

const CLIENTS: &[&str] = &[
    "Ada Lovelace",
    "Grace Hopper",
    "Katherine Johnson",
    "Hedy Lamarr",
    "Margaret Hamilton",
    "Radia Perlman",
    "Barbara Liskov",
    "Frances Allen",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./bloom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bloom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of bookings to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./bloom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bloom Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Bookings: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let (total, applied) = migration_status(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied ({}/{})", applied, total);

    if db.users().count().await? > 0 {
        println!("⚠ Database already has users");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, email, name) in STAFF {
        db.users()
            .upsert(&User {
                id: id.to_string(),
                email: email.to_string(),
                display_name: Some(name.to_string()),
            })
            .await?;
    }
    println!("✓ {} staff users", STAFF.len());

    let start = std::time::Instant::now();
    let day_start = Utc::now() - Duration::days(3);
    let (mut paid, mut refunds) = (0usize, 0usize);

    for n in 0..count {
        let (service, price_cents) = SERVICES[n % SERVICES.len()];
        let price = Money::from_cents(price_cents);
        let status = match n % 4 {
            0 => BookingStatus::Pending,
            1 | 2 => BookingStatus::Confirmed,
            _ => BookingStatus::Completed,
        };

        let booking = db
            .bookings()
            .create(&NewBooking {
                client_name: CLIENTS[n % CLIENTS.len()].to_string(),
                service_name: service.to_string(),
                starts_at: day_start + Duration::minutes(45 * n as i64),
                price,
                status,
            })
            .await?;

        let (cash, card) = match n % 3 {
            0 => {
                let cash = Money::from_cents(price_cents / 2);
                (cash, price - cash)
            }
            1 => (Money::from_cents(price_cents / 2), Money::zero()),
            _ => continue,
        };

        let payments = db
            .payments()
            .register_payment(&booking.id, cash, card, Some(STAFF[0].0))
            .await?;
        paid += 1;

        if paid % 5 == 0 {
            let refund = Money::from_cents(payments[0].amount.cents() / 4);
            if refund.is_positive() {
                db.ledger()
                    .register_refund(
                        &payments[0].id,
                        refund,
                        payments[0].method.as_str(),
                        Some("Goodwill discount"),
                        Some(STAFF[1].0),
                    )
                    .await?;
                refunds += 1;
            }
        }
    }

    println!();
    println!("✓ Generated {} bookings in {:?}", count, start.elapsed());
    println!("  {} with payments, {} refunds", paid, refunds);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

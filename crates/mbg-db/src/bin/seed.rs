//! # Seed Data Generator
//!
//! Populates an empty database with a small MBG supply chain for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./mbg.db with the default admin account
//! cargo run -p mbg-db --bin seed
//!
//! # Specify database URL and admin credentials
//! cargo run -p mbg-db --bin seed -- --db sqlite://data/mbg.db \
//!     --email admin@mbg.local --password changeme123
//! ```
//!
//! ## Generated Data
//! - One ADMIN account (the first registered user is always admin)
//! - A central warehouse, a kitchen and a distribution point
//! - Raw material and finished good categories and items
//! - Two suppliers and three beneficiary schools
//! - A `NASI-AYAM` recipe producing packed meals
//! - Opening stock for every raw material at the central warehouse

use chrono::{Duration, Utc};
use mbg_core::input::{
    BeneficiaryInput, CategoryInput, ItemInput, LocationInput, NewStock, RecipeInput,
    RecipeLineInput, RegisterUser, SupplierInput,
};
use mbg_core::{BeneficiaryType, ItemType, LocationType, Role};
use mbg_db::{Database, DbConfig, DEFAULT_DATABASE_URL};
use std::collections::HashMap;
use std::env;

/// Locations: (code, name, type)
const LOCATIONS: &[(&str, &str, LocationType)] = &[
    ("WH-PUSAT", "Gudang Pusat", LocationType::CentralWarehouse),
    ("DAPUR-01", "Dapur Umum 01", LocationType::Kitchen),
    ("DP-01", "Titik Distribusi 01", LocationType::DistributionPoint),
];

/// Categories: (code, name)
const CATEGORIES: &[(&str, &str)] = &[
    ("BAHAN", "Bahan Baku"),
    ("PROTEIN", "Protein"),
    ("SAYUR", "Sayur dan Buah"),
    ("MAKANAN", "Makanan Jadi"),
];

/// Items: (sku, name, category, type, unit, reorder point, price cents, shelf life days)
const ITEMS: &[(&str, &str, &str, ItemType, &str, f64, i64, Option<i64>)] = &[
    ("BRS-01", "Beras Medium", "BAHAN", ItemType::RawMaterial, "kg", 200.0, 1_250, Some(365)),
    ("MNY-01", "Minyak Goreng", "BAHAN", ItemType::RawMaterial, "liter", 40.0, 1_800, Some(180)),
    ("AYM-01", "Daging Ayam", "PROTEIN", ItemType::RawMaterial, "kg", 50.0, 3_600, Some(3)),
    ("TLR-01", "Telur Ayam", "PROTEIN", ItemType::RawMaterial, "kg", 30.0, 2_800, Some(14)),
    ("BYM-01", "Bayam", "SAYUR", ItemType::RawMaterial, "kg", 20.0, 1_000, Some(2)),
    ("PSG-01", "Pisang", "SAYUR", ItemType::RawMaterial, "kg", 25.0, 1_500, Some(5)),
    ("MBG-NA", "Paket Nasi Ayam", "MAKANAN", ItemType::FinishedGood, "portion", 0.0, 0, Some(1)),
];

/// Opening stock at the central warehouse: (sku, quantity, batch, days until expiry)
const OPENING_STOCK: &[(&str, f64, &str, i64)] = &[
    ("BRS-01", 1_000.0, "BRS-OPEN", 300),
    ("MNY-01", 120.0, "MNY-OPEN", 150),
    ("AYM-01", 150.0, "AYM-OPEN-A", 2),
    ("AYM-01", 100.0, "AYM-OPEN-B", 3),
    ("TLR-01", 80.0, "TLR-OPEN", 10),
    ("BYM-01", 40.0, "BYM-OPEN", 2),
    ("PSG-01", 60.0, "PSG-OPEN", 4),
];

/// Recipe lines per 100 portions: (sku, quantity, unit)
const NASI_AYAM: &[(&str, f64, &str)] = &[
    ("BRS-01", 8.0, "kg"),
    ("AYM-01", 6.0, "kg"),
    ("MNY-01", 1.0, "liter"),
    ("BYM-01", 3.0, "kg"),
    ("PSG-01", 10.0, "kg"),
];

/// Beneficiaries: (code, name, target portions)
const SCHOOLS: &[(&str, &str, i64)] = &[
    ("SDN-01", "SD Negeri 01", 320),
    ("SDN-02", "SD Negeri 02", 280),
    ("SMPN-01", "SMP Negeri 01", 450),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_url = String::from(DEFAULT_DATABASE_URL);
    let mut email = String::from("admin@mbg.local");
    let mut password = String::from("admin12345");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--email" | "-e" => {
                if i + 1 < args.len() {
                    email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("MBG Inventory Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <URL>          Database URL (default: {DEFAULT_DATABASE_URL})");
                println!("  -e, --email <EMAIL>     Admin email (default: admin@mbg.local)");
                println!("  -p, --password <PASS>   Admin password (default: admin12345)");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 MBG Inventory Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_url);
    println!();

    let db = Database::new(DbConfig::new(&db_url)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Admin account
    let admin = db
        .users()
        .register(
            &RegisterUser {
                email: email.clone(),
                name: "Administrator".to_string(),
                password: password.clone(),
                role: Some(Role::Admin),
                location_id: None,
            },
            &hash_password(&password)?,
        )
        .await?;
    println!("✓ Admin account: {} ({})", admin.email, admin.role);

    // Locations
    let mut locations = HashMap::new();
    for (code, name, location_type) in LOCATIONS {
        let location = db
            .locations()
            .create(&LocationInput {
                code: code.to_string(),
                name: name.to_string(),
                location_type: *location_type,
                address: None,
                capacity_kg: None,
                is_active: true,
            })
            .await?;
        locations.insert(*code, location.id);
    }
    println!("✓ {} locations", locations.len());

    // Categories and items
    let mut categories = HashMap::new();
    for (code, name) in CATEGORIES {
        let category = db
            .categories()
            .create(&CategoryInput {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
            })
            .await?;
        categories.insert(*code, category.id);
    }

    let mut items = HashMap::new();
    for (sku, name, category, item_type, unit, reorder_point, price_cents, shelf_life_days) in
        ITEMS
    {
        let item = db
            .items()
            .create(&ItemInput {
                sku: sku.to_string(),
                code: sku.to_string(),
                name: name.to_string(),
                description: None,
                item_type: *item_type,
                unit: unit.to_string(),
                category_id: categories.get(category).cloned(),
                reorder_point: *reorder_point,
                price_cents: *price_cents,
                shelf_life_days: *shelf_life_days,
                is_active: true,
            })
            .await?;
        items.insert(*sku, item.id);
    }
    println!("✓ {} categories, {} items", categories.len(), items.len());

    // Suppliers
    for (code, name, phone) in [
        ("SUP-TANI", "Koperasi Tani Makmur", "081200000001"),
        ("SUP-UNGGAS", "CV Unggas Sejahtera", "081200000002"),
    ] {
        db.suppliers()
            .create(&SupplierInput {
                code: code.to_string(),
                name: name.to_string(),
                contact_name: None,
                phone: Some(phone.to_string()),
                email: None,
                address: None,
                is_active: true,
            })
            .await?;
    }
    println!("✓ 2 suppliers");

    // Beneficiaries
    let distribution_point = locations.get("DP-01").cloned();
    for (code, name, target_portions) in SCHOOLS {
        db.beneficiaries()
            .create(&BeneficiaryInput {
                code: code.to_string(),
                name: name.to_string(),
                beneficiary_type: BeneficiaryType::School,
                address: None,
                contact_name: None,
                phone: None,
                target_portions: *target_portions,
                location_id: distribution_point.clone(),
                is_active: true,
            })
            .await?;
    }
    println!("✓ {} beneficiaries", SCHOOLS.len());

    // Recipe
    let recipe = db
        .recipes()
        .create(&RecipeInput {
            code: "NASI-AYAM".to_string(),
            name: "Nasi Ayam Bayam".to_string(),
            output_item_id: items["MBG-NA"].clone(),
            portion_size: 100.0,
            portion_unit: "portion".to_string(),
            instructions: Some("Masak nasi, goreng ayam, tumis bayam, sajikan dengan pisang.".into()),
            is_active: true,
            items: NASI_AYAM
                .iter()
                .map(|(sku, quantity, unit)| RecipeLineInput {
                    item_id: items[sku].clone(),
                    quantity: *quantity,
                    unit: unit.to_string(),
                })
                .collect(),
        })
        .await?;
    println!("✓ Recipe {} ({} ingredients)", recipe.recipe.code, recipe.items.len());

    // Opening stock
    let warehouse = locations["WH-PUSAT"].clone();
    let today = Utc::now().date_naive();
    for (sku, quantity, batch, days) in OPENING_STOCK {
        db.stock()
            .create(
                &NewStock {
                    item_id: items[sku].clone(),
                    location_id: warehouse.clone(),
                    quantity: *quantity,
                    batch_number: batch.to_string(),
                    expiry_date: Some(today + Duration::days(*days)),
                },
                Some(admin.id.as_str()),
            )
            .await?;
    }
    println!("✓ {} opening stock batches", OPENING_STOCK.len());

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());
    println!("  Sign in with {} / {}", email, password);

    Ok(())
}

/// Hashes the admin password the same way the API does on registration.
fn hash_password(password: &str) -> Result<String, Box<dyn std::error::Error>> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

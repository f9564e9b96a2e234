//! Seed data script - populates the database with the hostel and its website content
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates, when missing:
//! - the configured hostel
//! - 4 rooms (two dorms, two privates)
//! - FAQ entries in English and Spanish
//! - house rules shown during check-in
//! - the default hero images
//!
//! Tables that already hold rows for the hostel are left alone.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::info;
use uuid::Uuid;

use hostel_api::{
    config::{self, AppConfig},
    db,
    entities::{
        faq, hostel, hostel_image, hostel_rule,
        room::{self, RoomType},
    },
    services::{
        content::{default_hero_images, HERO_CATEGORY},
        rooms::to_cents,
    },
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Seed the hostel, rooms and website content")]
struct Args {
    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Run pending migrations first
    #[arg(long)]
    migrate: bool,
}

const ROOMS: [(&str, &str, RoomType, i32, i32, Decimal); 4] = [
    (
        "4-Bed Mixed Dorm",
        "Comfortable mixed dormitory with 4 beds, personal lockers, and shared bathroom.",
        RoomType::Dorm,
        4,
        4,
        dec!(12),
    ),
    (
        "6-Bed Mixed Dorm",
        "Spacious mixed dormitory with 6 beds, personal lockers, and shared bathroom.",
        RoomType::Dorm,
        6,
        6,
        dec!(10),
    ),
    (
        "Private Double Room",
        "Cozy private room with a double bed, perfect for couples or solo travelers wanting privacy.",
        RoomType::Private,
        1,
        2,
        dec!(35),
    ),
    (
        "Private Twin Room",
        "Private room with two single beds, ideal for friends traveling together.",
        RoomType::Private,
        2,
        2,
        dec!(38),
    ),
];

const FAQ: [(&str, &str, &str, &str); 4] = [
    (
        "What time is check-in and check-out?",
        "¿A qué hora es el check-in y check-out?",
        "Check-in is from 2:00 PM and check-out is until 11:00 AM. Early check-in or late check-out may be available upon request.",
        "El check-in es a partir de las 14:00 y el check-out hasta las 11:00. Check-in temprano o check-out tardío pueden estar disponibles bajo solicitud.",
    ),
    (
        "Is breakfast included?",
        "¿El desayuno está incluido?",
        "Yes! We offer a complimentary breakfast every morning with coffee, tea, bread, butter, jam, and fruit.",
        "¡Sí! Ofrecemos un desayuno gratuito cada mañana con café, té, pan, manteca, mermelada y fruta.",
    ),
    (
        "Do you have parking?",
        "¿Tienen estacionamiento?",
        "We have limited street parking available. Please contact us in advance if you need parking.",
        "Tenemos estacionamiento limitado en la calle. Por favor contáctenos con anticipación si necesita estacionamiento.",
    ),
    (
        "Can I store my luggage?",
        "¿Puedo guardar mi equipaje?",
        "Yes, we offer free luggage storage for guests before check-in and after check-out.",
        "Sí, ofrecemos almacenamiento de equipaje gratuito para huéspedes antes del check-in y después del check-out.",
    ),
];

const RULES: [(&str, &str, &str, &str); 4] = [
    (
        "Quiet hours",
        "Horario de silencio",
        "Please keep noise down between 11:00 PM and 8:00 AM.",
        "Por favor mantené el silencio entre las 23:00 y las 8:00.",
    ),
    (
        "No smoking indoors",
        "Prohibido fumar adentro",
        "Smoking is only allowed on the outdoor terrace.",
        "Solo se permite fumar en la terraza exterior.",
    ),
    (
        "Visitors",
        "Visitas",
        "Visitors must register at reception and leave by 10:00 PM.",
        "Las visitas deben registrarse en recepción y retirarse antes de las 22:00.",
    ),
    (
        "Kitchen",
        "Cocina",
        "Clean up after yourself and label food you keep in the fridge.",
        "Limpiá lo que uses y etiquetá la comida que guardes en la heladera.",
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);
    if let Some(url) = args.database_url {
        cfg.database_url = url;
    }

    info!("=== Hostel API Seed Data ===");
    let db = db::establish_connection(&cfg.database_url)
        .await
        .context("failed to connect to the database")?;
    if args.migrate {
        db::run_migrations(&db).await?;
        info!("Migrations applied");
    }

    seed_hostel(&db, &cfg).await?;
    info!("  Rooms: {}", seed_rooms(&db, &cfg).await?);
    info!("  FAQ entries: {}", seed_faq(&db, &cfg).await?);
    info!("  House rules: {}", seed_rules(&db, &cfg).await?);
    info!("  Hero images: {}", seed_hero_images(&db, &cfg).await?);

    info!("=== Seed Data Complete ===");
    info!("Try: curl http://localhost:{}/api/v1/rooms", cfg.port);
    Ok(())
}

async fn seed_hostel(db: &DatabaseConnection, cfg: &AppConfig) -> anyhow::Result<()> {
    if hostel::Entity::find_by_id(cfg.hostel_id).one(db).await?.is_some() {
        info!("Hostel {} already present", cfg.hostel_id);
        return Ok(());
    }

    let now = Utc::now();
    hostel::ActiveModel {
        id: Set(cfg.hostel_id),
        name: Set(cfg.hostel_name.clone()),
        slug: Set("mandioca-hostel".to_string()),
        city: Set("Asunción".to_string()),
        country: Set("Paraguay".to_string()),
        address: Set(Some("Avenida Mcal. López 924 c/ Tacuary".to_string())),
        description: Set(Some(
            "Your home in the heart of Asunción, Paraguay.".to_string(),
        )),
        email: Set(Some(cfg.hostel_email.clone())),
        phone: Set(None),
        timezone_offset_minutes: Set(cfg.hostel_timezone_offset_minutes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!("Hostel {} created", cfg.hostel_id);
    Ok(())
}

async fn seed_rooms(db: &DatabaseConnection, cfg: &AppConfig) -> anyhow::Result<usize> {
    let existing = room::Entity::find()
        .filter(room::Column::HostelId.eq(cfg.hostel_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let now = Utc::now();
    for (order, (name, description, room_type, beds, max_guests, price)) in
        ROOMS.into_iter().enumerate()
    {
        room::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(cfg.hostel_id),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            room_type: Set(room_type),
            bed_count: Set(beds),
            max_guests: Set(max_guests),
            price_per_night_cents: Set(to_cents(price)?),
            currency: Set(cfg.currency.clone()),
            is_active: Set(true),
            display_order: Set(order as i32 + 1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(ROOMS.len())
}

async fn seed_faq(db: &DatabaseConnection, cfg: &AppConfig) -> anyhow::Result<usize> {
    let existing = faq::Entity::find()
        .filter(faq::Column::HostelId.eq(cfg.hostel_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let now = Utc::now();
    for (order, (question, question_es, answer, answer_es)) in FAQ.into_iter().enumerate() {
        faq::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(cfg.hostel_id),
            question: Set(question.to_string()),
            question_es: Set(Some(question_es.to_string())),
            answer: Set(answer.to_string()),
            answer_es: Set(Some(answer_es.to_string())),
            display_order: Set(order as i32 + 1),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(FAQ.len())
}

async fn seed_rules(db: &DatabaseConnection, cfg: &AppConfig) -> anyhow::Result<usize> {
    let existing = hostel_rule::Entity::find()
        .filter(hostel_rule::Column::HostelId.eq(cfg.hostel_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    for (order, (title, title_es, description, description_es)) in RULES.into_iter().enumerate() {
        hostel_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(cfg.hostel_id),
            title: Set(title.to_string()),
            title_es: Set(Some(title_es.to_string())),
            description: Set(description.to_string()),
            description_es: Set(Some(description_es.to_string())),
            display_order: Set(order as i32 + 1),
            is_active: Set(true),
        }
        .insert(db)
        .await?;
    }
    Ok(RULES.len())
}

async fn seed_hero_images(db: &DatabaseConnection, cfg: &AppConfig) -> anyhow::Result<usize> {
    let existing = hostel_image::Entity::find()
        .filter(hostel_image::Column::HostelId.eq(cfg.hostel_id))
        .filter(hostel_image::Column::Category.eq(HERO_CATEGORY))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let now = Utc::now();
    let heroes = default_hero_images();
    for hero in &heroes {
        hostel_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(cfg.hostel_id),
            image_url: Set(hero.image_url.clone()),
            alt_text: Set(hero.alt_text.clone()),
            alt_text_es: Set(hero.alt_text_es.clone()),
            category: Set(HERO_CATEGORY.to_string()),
            display_order: Set(hero.display_order),
            position_x: Set(hero.position_x),
            position_y: Set(hero.position_y),
            size: Set(hero.size.clone()),
            rotation: Set(hero.rotation),
            show_on_mobile: Set(hero.show_on_mobile),
            created_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(heroes.len())
}

use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use antigravity_rs::{
    Amount, Category, NewCategory, NewTransaction, NewUser, PasswordHash, Profile,
    TransactionType, ValidatedPassword, create_category, create_transaction, create_user,
    initialize_db,
};

/// A utility for creating a demo database for the antigravity server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// How many days back the sample transactions go.
const HISTORY_DAYS: i64 = 180;
const EXPENSE_COUNT: usize = 150;
const REVENUE_COUNT: usize = 30;
const SALARY_MONTHS: i64 = 6;
const MONTHLY_SALARY_CENTS: i64 = 350_000;

/// A default category with the descriptions and amount range of its sample transactions.
struct Template {
    name: &'static str,
    icon: &'static str,
    descriptions: &'static [&'static str],
    min_cents: i64,
    max_cents: i64,
}

static EXPENSE_TEMPLATES: [Template; 6] = [
    Template {
        name: "Grocery",
        icon: "cart",
        descriptions: &[
            "Weekly groceries",
            "Supermarket shopping",
            "Fresh produce",
            "Snacks and drinks",
        ],
        min_cents: 3_000,
        max_cents: 15_000,
    },
    Template {
        name: "Transport",
        icon: "car",
        descriptions: &["Gas refill", "Uber ride", "Monthly metro pass", "Parking fee"],
        min_cents: 1_000,
        max_cents: 8_000,
    },
    Template {
        name: "Utilities",
        icon: "bolt",
        descriptions: &[
            "Electricity bill",
            "Internet bill",
            "Water bill",
            "Phone bill",
        ],
        min_cents: 5_000,
        max_cents: 20_000,
    },
    Template {
        name: "Entertainment",
        icon: "film",
        descriptions: &[
            "Movie tickets",
            "Streaming subscription",
            "Concert tickets",
            "Restaurant dinner",
        ],
        min_cents: 2_000,
        max_cents: 10_000,
    },
    Template {
        name: "Health",
        icon: "heart",
        descriptions: &["Pharmacy", "Doctor visit", "Gym membership", "Vitamins"],
        min_cents: 1_500,
        max_cents: 15_000,
    },
    Template {
        name: "Others",
        icon: "box",
        descriptions: &["Clothes shopping", "Home supplies", "Books", "Gifts"],
        min_cents: 2_000,
        max_cents: 10_000,
    },
];

static REVENUE_TEMPLATES: [Template; 4] = [
    Template {
        name: "Salary",
        icon: "briefcase",
        descriptions: &["Monthly salary", "Bonus payment", "Overtime pay"],
        min_cents: 250_000,
        max_cents: 400_000,
    },
    Template {
        name: "Freelance",
        icon: "laptop",
        descriptions: &[
            "Web design project",
            "Consulting work",
            "Logo design",
            "Content writing",
        ],
        min_cents: 20_000,
        max_cents: 150_000,
    },
    Template {
        name: "Investments",
        icon: "chart",
        descriptions: &["Stock dividends", "Crypto gains", "Interest income"],
        min_cents: 5_000,
        max_cents: 50_000,
    },
    Template {
        name: "Others",
        icon: "gift",
        descriptions: &["Gift received", "Refund", "Cashback"],
        min_cents: 5_000,
        max_cents: 30_000,
    },
];

/// Create and populate a database for demonstrating the analytics.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let tx = conn.transaction()?;

    println!("Creating demo user...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("demo123"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser {
            username: "demo".to_owned(),
            email: "demo@antigravity.com".to_owned(),
            password_hash,
            profile: Profile::default(),
        },
        &tx,
    )?;

    println!("Creating categories...");
    let expense_categories = create_categories(&EXPENSE_TEMPLATES, TransactionType::Expense, &tx)?;
    let revenue_categories = create_categories(&REVENUE_TEMPLATES, TransactionType::Revenue, &tx)?;

    println!("Creating sample transactions...");
    let today = OffsetDateTime::now_utc().date();
    let mut transaction_count = 0;

    let samples = (0..EXPENSE_COUNT)
        .map(|i| (i, TransactionType::Expense, &EXPENSE_TEMPLATES[..], &expense_categories))
        .chain(
            (0..REVENUE_COUNT)
                .map(|i| (i, TransactionType::Revenue, &REVENUE_TEMPLATES[..], &revenue_categories)),
        );

    for (i, kind, templates, categories) in samples {
        let index = i % templates.len();
        let template = &templates[index];
        let description = template.descriptions[(i / templates.len()) % template.descriptions.len()];

        create_transaction(
            NewTransaction {
                user_id: user.id,
                date: today - Duration::days(spread(i, 0, HISTORY_DAYS)),
                category_id: categories[index].id,
                description: description.to_owned(),
                amount: Amount::from_cents(spread(i, template.min_cents, template.max_cents)),
                kind,
            },
            &tx,
        )?;
        transaction_count += 1;
    }

    let salary_category = &revenue_categories[0];
    for month in 0..SALARY_MONTHS {
        create_transaction(
            NewTransaction {
                user_id: user.id,
                date: today - Duration::days(30 * month),
                category_id: salary_category.id,
                description: "Monthly salary".to_owned(),
                amount: Amount::from_cents(MONTHLY_SALARY_CENTS),
                kind: TransactionType::Revenue,
            },
            &tx,
        )?;
        transaction_count += 1;
    }

    tx.commit()?;

    println!("Success!");
    println!("  - Created user: demo / demo123");
    println!("  - Created {} expense categories", expense_categories.len());
    println!("  - Created {} revenue categories", revenue_categories.len());
    println!("  - Created {transaction_count} sample transactions");

    Ok(())
}

fn create_categories(
    templates: &[Template],
    kind: TransactionType,
    connection: &Connection,
) -> Result<Vec<Category>, antigravity_rs::Error> {
    templates
        .iter()
        .map(|template| {
            create_category(
                NewCategory {
                    name: template.name.to_owned(),
                    kind,
                    icon: template.icon.to_owned(),
                },
                connection,
            )
        })
        .collect()
}

/// A value in `min..=max` that jumps around as `i` increases.
///
/// The demo data is deterministic: the same dates and amounts are generated on
/// every run, so a freshly built demo database always shows the same charts.
fn spread(i: usize, min: i64, max: i64) -> i64 {
    // A large prime step visits the range in a scattered order.
    min + (i as i64 * 7_919) % (max - min + 1)
}

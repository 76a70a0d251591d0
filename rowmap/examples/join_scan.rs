//! Scan a joined result set with a notation column into nested records.
//!
//! Run with `RUST_LOG=rowmap_scan=trace` to see the column rewriting and
//! the discarded columns.

use rowmap::{MemoryRows, Rows, ScanOptions, Value, impl_record};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Address {
    id: i64,
    city: String,
}

#[derive(Debug, Default)]
struct User {
    id: i64,
    name: String,
    address: Option<Box<Address>>,
}

impl_record!(Address { id, city });
impl_record!(User {
    id,
    name,
    address: r#"scan:"notate""#,
});

fn main() -> rowmap::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // SELECT u.*, 0 AS "notate:address", a.* FROM users u LEFT JOIN addresses a ...
    let source = MemoryRows::new(
        ["id", "name", "notate:address", "id", "user_id", "city"],
        vec![
            vec![
                Value::Int(1),
                Value::from("ada"),
                Value::Int(0),
                Value::Int(10),
                Value::Int(1),
                Value::from("London"),
            ],
            vec![
                Value::Int(2),
                Value::from("grace"),
                Value::Int(0),
                Value::Null,
                Value::Null,
                Value::Null,
            ],
        ],
    );

    let options = ScanOptions {
        match_all_columns: false,
        ..ScanOptions::default()
    };
    let mut users: Vec<User> = Vec::new();
    Rows::new(source).with_options(options).scan_all(&mut users)?;

    for user in &users {
        match &user.address {
            Some(address) => println!(
                "{} {} lives in {} (address {})",
                user.id, user.name, address.city, address.id
            ),
            None => println!("{} {} has no address", user.id, user.name),
        }
    }
    Ok(())
}

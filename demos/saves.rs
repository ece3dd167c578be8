//! BLOB columns and file-backed configuration example.
//!
//! Stores a serde structure in a BLOB column of a database file whose
//! settings come from a YAML config, then reopens it and reads the rows
//! back with group and paging clauses.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rowforge-demos --example saves
//! ```

use std::collections::BTreeMap;

use rowforge_core::{BindMode, Blob, Direction, Expr, Record, TableBuilder};
use rowforge_sqlite::{Database, DatabaseConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Inventory {
    gold: u32,
    items: BTreeMap<String, u16>,
}

#[derive(Debug, Default)]
struct Save {
    slot: i64,
    player: String,
    level: i32,
    inventory: Blob<Inventory>,
}

impl Record for Save {
    fn describe(table: &mut TableBuilder<Self>) {
        table.name("saves");
        table.column("slot", |s| &s.slot, |s| &mut s.slot).primary_key();
        table.column("player", |s| &s.player, |s| &mut s.player).not_null();
        table
            .column("level", |s| &s.level, |s| &mut s.level)
            .default(1);
        table.column("inventory", |s| &s.inventory, |s| &mut s.inventory);
    }
}

fn main() {
    // === Step 1: Write a config next to the database file ===
    let dir = std::env::temp_dir().join("rowforge_saves_example");
    std::fs::create_dir_all(&dir).unwrap();
    let db_path = dir.join("saves.db");
    let _ = std::fs::remove_file(&db_path);

    let config_path = dir.join("rowforge.yaml");
    DatabaseConfig::at(&db_path)
        .with_bind_mode(BindMode::Parameters)
        .with_create_tables(true)
        .save(&config_path)
        .unwrap();
    println!("=== Config ===");
    println!("{}", std::fs::read_to_string(&config_path).unwrap());

    // === Step 2: Store a few saves ===
    {
        let db = Database::open(DatabaseConfig::load(&config_path).unwrap()).unwrap();
        let saves = db.table::<Save>().unwrap();

        for (slot, player, level, gold) in [(1, "ann", 4, 120), (2, "bob", 9, 15), (3, "ann", 7, 300)] {
            let mut items = BTreeMap::new();
            items.insert("potion".to_string(), level as u16);
            let save = Save {
                slot,
                player: player.to_string(),
                level,
                inventory: Blob(Inventory { gold, items }),
            };
            let command = saves.insert_or_replace(&save).unwrap();
            println!("{}  params={:?}", command.sql(), command.params().iter().map(|p| &p.name).collect::<Vec<_>>());
            command.execute().unwrap();
        }
    }

    // === Step 3: Reopen and read ===
    println!("\n=== Reopened ===");
    let db = Database::open(DatabaseConfig::load(&config_path).unwrap()).unwrap();
    println!("Table status: {:?}", db.ensure_table::<Save>().unwrap());
    let saves = db.table::<Save>().unwrap();

    let best = saves
        .select_all()
        .filter(Expr::col("player").eq("ann"))
        .unwrap()
        .order_by(&["level"], Direction::Desc)
        .unwrap()
        .limit(1)
        .fetch_all()
        .unwrap();
    for save in &best {
        println!(
            "Best save for {}: slot {} level {} gold {} items {:?}",
            save.player, save.slot, save.level, save.inventory.gold, save.inventory.items
        );
    }

    let players = saves
        .select(&["player"])
        .unwrap()
        .group_by(&["player"])
        .unwrap()
        .having(Expr::count().gt(1))
        .unwrap();
    println!("\n{}", players.sql());
    for save in players.fetch_all().unwrap() {
        println!("  {} has several saves", save.player);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `postkeep_core` linkage and wire config, logging and the facade.
//! - Print the first listing page so a backend can be checked by eye.
//!
//! Usage: `postkeep_cli [config.json]`. Without a config file the in-memory
//! document store is used. `POSTKEEP_LOG_DIR` enables file logging.

use log::info;
use postkeep_core::{
    default_log_level, init_logging, DataLayer, DataLayerConfig, PageSlot, Role,
};
use std::error::Error;

const LOG_DIR_ENV: &str = "POSTKEEP_LOG_DIR";
const DEMO_USER: &str = "admin";
const DEMO_PASSWORD: &str = "admin";

fn main() -> Result<(), Box<dyn Error>> {
    println!("postkeep_core ping={}", postkeep_core::ping());
    println!("postkeep_core version={}", postkeep_core::core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        init_logging(default_log_level(), &log_dir)?;
    }

    let config = match std::env::args().nth(1) {
        Some(path) => DataLayerConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => DataLayerConfig::document(),
    };
    let layer = DataLayer::new(config)?;
    println!("backend={}", layer.backend_kind());

    seed_demo_content(&layer)?;

    let request = layer.begin_request(None)?;
    match request.list_entries(None, 1)? {
        Some(page) => {
            println!(
                "entries={} pages={} window={}",
                page.total_entries,
                page.total_pages,
                render_window(&page.pages)
            );
            for item in &page.entries {
                println!(
                    "{}  {}  by {}  [{}]  {}",
                    item.human_date,
                    item.entry.title,
                    item.author.as_deref().unwrap_or("?"),
                    item.tags.join(" "),
                    item.permalink()
                );
            }
        }
        None => println!("entries=0"),
    }
    request.finish()?;
    Ok(())
}

/// Provisions a demo admin and a welcome entry when the store has none.
fn seed_demo_content(layer: &DataLayer) -> Result<(), Box<dyn Error>> {
    let lookup = layer.begin_request(None)?;
    let existing = lookup.get_user(DEMO_USER)?;
    lookup.finish()?;

    let admin = match existing {
        Some(user) => user,
        None => layer.provision_user(DEMO_USER, DEMO_PASSWORD, Role::Admin)?,
    };

    let mut request = layer.begin_request(Some(admin.id))?;
    let empty = request
        .list_entries(None, 1)?
        .map_or(true, |page| page.total_entries == 0);
    if empty {
        let entry = request.add_entry(
            "Hello, Postkeep!",
            "First entry.\n\n---\n\nEverything after the rule only shows on the entry page.",
            "welcome meta",
        )?;
        info!("event=demo_seed module=cli status=ok entry_id={}", entry.id);
    }
    request.finish()?;
    Ok(())
}

fn render_window(slots: &[PageSlot]) -> String {
    slots
        .iter()
        .map(|slot| match slot {
            PageSlot::Page(page) => page.to_string(),
            PageSlot::Gap => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

//! Partner listing and removal against the record store.

use clap::Subcommand;
use radar_core::{filter_partners, Business, SectorFilter};

/// Sub-commands available under `partners`.
#[derive(Debug, Subcommand)]
pub enum PartnerCommands {
    /// List partners, premium first
    List {
        /// Restrict to one sector (e.g. Salud), or "all"
        #[arg(long, default_value = "all")]
        sector: SectorFilter,
        /// Case-insensitive match on name, category or sector
        #[arg(long)]
        search: Option<String>,
    },
    /// Delete a partner by id
    Delete {
        /// Partner id (e.g. SLP-001)
        id: String,
    },
}

pub(crate) async fn run(pool: &sqlx::PgPool, command: PartnerCommands) -> anyhow::Result<()> {
    match command {
        PartnerCommands::List { sector, search } => {
            run_list(pool, sector, search.as_deref().unwrap_or_default()).await
        }
        PartnerCommands::Delete { id } => {
            radar_db::delete_partner(pool, &id).await?;
            println!("deleted partner {id}");
            Ok(())
        }
    }
}

async fn run_list(pool: &sqlx::PgPool, sector: SectorFilter, search: &str) -> anyhow::Result<()> {
    let all = radar_db::list_partners(pool).await?;
    let visible = filter_partners(&all, search, sector);

    if visible.is_empty() {
        println!("no partners match (sector {sector}); run `seed` to load the directory");
        return Ok(());
    }

    println!(
        "{:<16}{:<32}{:<14}{:<10}{:<8}RATING",
        "ID", "NAME", "SECTOR", "STATUS", "PREMIUM"
    );
    for partner in &visible {
        println!("{}", format_row(partner));
    }
    println!("{} of {} partners", visible.len(), all.len());
    Ok(())
}

fn format_row(partner: &Business) -> String {
    let name = if partner.name.chars().count() > 30 {
        format!("{}...", partner.name.chars().take(27).collect::<String>())
    } else {
        partner.name.clone()
    };
    format!(
        "{:<16}{:<32}{:<14}{:<10}{:<8}{:.1}",
        partner.id,
        name,
        partner.sector.label(),
        partner.status.to_string(),
        if partner.is_premium { "yes" } else { "" },
        partner.rating
    )
}

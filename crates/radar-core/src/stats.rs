use std::collections::BTreeMap;

use crate::Business;

/// Aggregate figures for the admin metrics view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryStats {
    pub total: usize,
    pub premium: usize,
    /// Partner count per sector label; sectors without partners are absent.
    pub by_sector: BTreeMap<&'static str, usize>,
    pub views: i64,
    pub leads: i64,
}

impl DirectoryStats {
    #[must_use]
    pub fn from_partners(partners: &[Business]) -> Self {
        let mut stats = DirectoryStats {
            total: partners.len(),
            ..DirectoryStats::default()
        };
        for b in partners {
            if b.is_premium {
                stats.premium += 1;
            }
            *stats.by_sector.entry(b.sector.label()).or_insert(0) += 1;
            stats.views = stats.views.saturating_add(b.view_count.unwrap_or(0));
            stats.leads = stats.leads.saturating_add(b.lead_count.unwrap_or(0));
        }
        stats
    }
}

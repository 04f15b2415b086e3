//! Directory search and sector filtering.
//!
//! A linear scan that keeps the input order. The store already returns
//! premium partners first, so the visible list inherits that ranking.

use crate::{Business, CoreError, Sector};

/// Sector selector with an "all" sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectorFilter {
    #[default]
    All,
    Only(Sector),
}

impl SectorFilter {
    #[must_use]
    pub fn admits(self, sector: Sector) -> bool {
        match self {
            SectorFilter::All => true,
            SectorFilter::Only(wanted) => wanted == sector,
        }
    }
}

impl std::fmt::Display for SectorFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectorFilter::All => f.write_str("all"),
            SectorFilter::Only(sector) => write!(f, "{sector}"),
        }
    }
}

impl std::str::FromStr for SectorFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todos" => Ok(SectorFilter::All),
            _ => s.parse::<Sector>().map(SectorFilter::Only),
        }
    }
}

/// `true` when `term` (already lowercased and trimmed) occurs in the
/// partner's name, category, or sector label.
fn matches_term(partner: &Business, term: &str) -> bool {
    term.is_empty()
        || partner.name.to_lowercase().contains(term)
        || partner.category.to_lowercase().contains(term)
        || partner.sector.label().to_lowercase().contains(term)
}

/// Returns the partners admitted by `sector` whose name, category, or sector
/// contains `term` case-insensitively. An empty term matches everything.
#[must_use]
pub fn filter_partners(partners: &[Business], term: &str, sector: SectorFilter) -> Vec<Business> {
    let term = term.trim().to_lowercase();
    partners
        .iter()
        .filter(|b| sector.admits(b.sector) && matches_term(b, &term))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PartnerStatus;

    fn partner(id: &str, name: &str, sector: Sector, category: &str) -> Business {
        Business {
            id: id.to_string(),
            name: name.to_string(),
            sector,
            category: category.to_string(),
            description: String::new(),
            address: String::new(),
            city: String::new(),
            office_phone: String::new(),
            whatsapp: None,
            email: None,
            website: None,
            services: vec![],
            gallery: vec![],
            x: 22.15,
            y: -100.98,
            rating: 5.0,
            reliability: 100,
            status: PartnerStatus::Active,
            logo: "logo.png".to_string(),
            is_premium: false,
            industrial_capacity: None,
            view_count: None,
            lead_count: None,
        }
    }

    fn ids(list: &[Business]) -> Vec<&str> {
        list.iter().map(|b| b.id.as_str()).collect()
    }

    fn store_snapshot() -> Vec<Business> {
        vec![
            partner("A", "Foo", Sector::Industrial, "Fundición"),
            partner("B", "Bar", Sector::Health, "Clínica"),
        ]
    }

    #[test]
    fn sector_only_with_empty_term() {
        let out = filter_partners(&store_snapshot(), "", SectorFilter::Only(Sector::Industrial));
        assert_eq!(ids(&out), ["A"]);
    }

    #[test]
    fn term_matches_name_case_insensitively() {
        let out = filter_partners(&store_snapshot(), "bar", SectorFilter::All);
        assert_eq!(ids(&out), ["B"]);
        let out = filter_partners(&store_snapshot(), "BAR", SectorFilter::All);
        assert_eq!(ids(&out), ["B"]);
    }

    #[test]
    fn term_matches_category_and_sector_label() {
        let list = store_snapshot();
        assert_eq!(ids(&filter_partners(&list, "clín", SectorFilter::All)), ["B"]);
        assert_eq!(ids(&filter_partners(&list, "salud", SectorFilter::All)), ["B"]);
        assert_eq!(
            ids(&filter_partners(&list, "indus", SectorFilter::All)),
            ["A"]
        );
    }

    #[test]
    fn term_is_trimmed() {
        let out = filter_partners(&store_snapshot(), "  foo ", SectorFilter::All);
        assert_eq!(ids(&out), ["A"]);
    }

    #[test]
    fn sector_and_term_must_both_match() {
        let out = filter_partners(&store_snapshot(), "bar", SectorFilter::Only(Sector::Industrial));
        assert!(out.is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let list = vec![
            partner("P1", "Alpha Steel", Sector::Industrial, "Acero"),
            partner("P2", "Beta Freight", Sector::Logistics, "Carga"),
            partner("P3", "Gamma Steel", Sector::Industrial, "Acero"),
            partner("P4", "Delta Steelworks", Sector::Construction, "Obra"),
        ];
        let out = filter_partners(&list, "steel", SectorFilter::All);
        assert_eq!(ids(&out), ["P1", "P3", "P4"]);
    }

    #[test]
    fn every_result_satisfies_the_predicate() {
        let list = vec![
            partner("P1", "Alpha", Sector::Industrial, "Acero"),
            partner("P2", "Beta", Sector::Logistics, "Carga pesada"),
            partner("P3", "Gamma", Sector::Health, "Laboratorio"),
            partner("P4", "Cargo Uno", Sector::Logistics, "Aduanas"),
            partner("P5", "Carga Sur", Sector::Commerce, "Tienda"),
        ];
        for sector in std::iter::once(SectorFilter::All)
            .chain(Sector::ALL.into_iter().map(SectorFilter::Only))
        {
            for term in ["", "carg", "LAB", "zzz"] {
                let out = filter_partners(&list, term, sector);
                let lower = term.to_lowercase();
                for b in &out {
                    assert!(sector.admits(b.sector));
                    assert!(
                        b.name.to_lowercase().contains(&lower)
                            || b.category.to_lowercase().contains(&lower)
                            || b.sector.label().to_lowercase().contains(&lower)
                    );
                }
                let expected = list
                    .iter()
                    .filter(|b| sector.admits(b.sector) && matches_term(b, &lower))
                    .count();
                assert_eq!(out.len(), expected);
            }
        }
    }

    #[test]
    fn sector_filter_parses_all_sentinels() {
        assert_eq!("all".parse::<SectorFilter>().unwrap(), SectorFilter::All);
        assert_eq!("Todos".parse::<SectorFilter>().unwrap(), SectorFilter::All);
        assert_eq!(
            "Salud".parse::<SectorFilter>().unwrap(),
            SectorFilter::Only(Sector::Health)
        );
        assert!("nope".parse::<SectorFilter>().is_err());
    }
}

//! Bulk reference catalogs mirrored from the publisher.

use std::fmt;

use serde::Serialize;

/// How a catalog is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// `?ids=all` in one request.
    All,
    /// Fetch the id index, then page through it in fixed blocks.
    Paged,
}

/// Secondary index created after a catalog is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogIndex {
    None,
    /// Case-insensitive prefix search on `name`.
    Name,
    /// Lookup by `output_item_id` (recipes).
    OutputItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Catalog {
    Items,
    Achievements,
    Itemstats,
    Titles,
    Recipes,
    Skins,
    Currencies,
    Skills,
    Specializations,
    Traits,
    Worlds,
    Minis,
}

impl Catalog {
    /// Rebuild order.
    pub const ALL: [Catalog; 12] = [
        Catalog::Items,
        Catalog::Achievements,
        Catalog::Itemstats,
        Catalog::Titles,
        Catalog::Recipes,
        Catalog::Skins,
        Catalog::Currencies,
        Catalog::Skills,
        Catalog::Specializations,
        Catalog::Traits,
        Catalog::Worlds,
        Catalog::Minis,
    ];

    /// Endpoint path relative to the API base.
    pub fn endpoint(self) -> &'static str {
        match self {
            Catalog::Items => "items",
            Catalog::Achievements => "achievements",
            Catalog::Itemstats => "itemstats",
            Catalog::Titles => "titles",
            Catalog::Recipes => "recipes",
            Catalog::Skins => "skins",
            Catalog::Currencies => "currencies",
            Catalog::Skills => "skills",
            Catalog::Specializations => "specializations",
            Catalog::Traits => "traits",
            Catalog::Worlds => "worlds",
            Catalog::Minis => "minis",
        }
    }

    /// Backing table; always `ref_<endpoint>`.
    pub fn table(self) -> &'static str {
        match self {
            Catalog::Items => "ref_items",
            Catalog::Achievements => "ref_achievements",
            Catalog::Itemstats => "ref_itemstats",
            Catalog::Titles => "ref_titles",
            Catalog::Recipes => "ref_recipes",
            Catalog::Skins => "ref_skins",
            Catalog::Currencies => "ref_currencies",
            Catalog::Skills => "ref_skills",
            Catalog::Specializations => "ref_specializations",
            Catalog::Traits => "ref_traits",
            Catalog::Worlds => "ref_worlds",
            Catalog::Minis => "ref_minis",
        }
    }

    pub fn mode(self) -> FetchMode {
        match self {
            Catalog::Items | Catalog::Achievements | Catalog::Recipes | Catalog::Skins => {
                FetchMode::Paged
            }
            _ => FetchMode::All,
        }
    }

    pub fn index(self) -> CatalogIndex {
        match self {
            Catalog::Items
            | Catalog::Achievements
            | Catalog::Titles
            | Catalog::Skins
            | Catalog::Currencies
            | Catalog::Skills
            | Catalog::Worlds => CatalogIndex::Name,
            Catalog::Recipes => CatalogIndex::OutputItem,
            _ => CatalogIndex::None,
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_follow_endpoint_names() {
        for catalog in Catalog::ALL {
            assert_eq!(catalog.table(), format!("ref_{}", catalog.endpoint()));
        }
    }

    #[test]
    fn name_indexed_catalogs() {
        let indexed: Vec<_> = Catalog::ALL
            .into_iter()
            .filter(|c| c.index() == CatalogIndex::Name)
            .map(|c| c.endpoint())
            .collect();
        assert_eq!(
            indexed,
            vec!["items", "achievements", "titles", "skins", "currencies", "skills", "worlds"]
        );
    }
}

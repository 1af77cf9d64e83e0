use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::models::Hero;

/// Reserved facet value meaning "no constraint on this dimension".
pub const ALL: &str = "all";

/// Value of a single facet (period or region).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Only(value) => value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named entry of the period tab bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPreset {
    /// Filter value, matched as a substring of `conflict`.
    pub value: String,
    /// Label shown in the tab bar.
    pub label: String,
}

impl PeriodPreset {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn selection(&self) -> Selection {
        Selection::from(self.value.as_str())
    }
}

/// Tab bar used when the configuration does not override it.
pub fn default_period_presets() -> Vec<PeriodPreset> {
    vec![
        PeriodPreset::new(ALL, "Все периоды"),
        PeriodPreset::new("Великая Отечественная война", "ВОВ 1941-1945"),
        PeriodPreset::new("Афганистан", "Афганистан"),
        PeriodPreset::new("Чечня", "Чечня"),
        PeriodPreset::new("СВО", "СВО"),
    ]
}

/// Search text plus the two facet selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroFilter {
    pub query: String,
    pub period: Selection,
    pub region: Selection,
}

impl HeroFilter {
    /// Case-insensitive substring match against name or rank.
    pub fn matches_query(&self, hero: &Hero) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        hero.name.to_lowercase().contains(&needle) || hero.rank.to_lowercase().contains(&needle)
    }

    /// The period value is looked up inside `conflict`, so broader labels match.
    pub fn matches_period(&self, hero: &Hero) -> bool {
        match &self.period {
            Selection::All => true,
            Selection::Only(period) => hero.conflict.contains(period.as_str()),
        }
    }

    /// Regions compare by exact equality.
    pub fn matches_region(&self, hero: &Hero) -> bool {
        match &self.region {
            Selection::All => true,
            Selection::Only(region) => hero.region == *region,
        }
    }

    pub fn matches(&self, hero: &Hero) -> bool {
        self.matches_query(hero) && self.matches_period(hero) && self.matches_region(hero)
    }

    /// Matching heroes in source order.
    pub fn apply<'a>(&self, heroes: &'a [Hero]) -> Vec<&'a Hero> {
        heroes.iter().filter(|hero| self.matches(hero)).collect()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.query.is_empty() && self.period.is_all() && self.region.is_all()
    }
}

/// `All` followed by the distinct regions in lexicographic order.
pub fn region_options(heroes: &[Hero]) -> Vec<Selection> {
    let regions: BTreeSet<&str> = heroes
        .iter()
        .map(|hero| hero.region.as_str())
        .filter(|region| !region.is_empty())
        .collect();
    std::iter::once(Selection::All)
        .chain(
            regions
                .into_iter()
                .map(|region| Selection::Only(region.to_string())),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hero, sample_heroes};

    fn ids(heroes: &[&Hero]) -> Vec<i64> {
        heroes.iter().map(|hero| hero.id).collect()
    }

    #[test]
    fn search_is_case_insensitive() {
        let heroes = sample_heroes();
        let filter = HeroFilter {
            query: "МАРЕСЬЕВ".to_string(),
            ..HeroFilter::default()
        };
        let found = filter.apply(&heroes);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Алексей Петрович Маресьев");
    }

    #[test]
    fn search_covers_rank() {
        let heroes = sample_heroes();
        let filter = HeroFilter {
            query: "лётчик".to_string(),
            ..HeroFilter::default()
        };
        assert_eq!(ids(&filter.apply(&heroes)), vec![1]);
    }

    #[test]
    fn period_is_substring_of_conflict() {
        let mut full = hero(10, "A");
        full.conflict = "Великая Отечественная война".to_string();
        let mut svo = hero(11, "B");
        svo.conflict = "Специальная военная операция (СВО)".to_string();
        let heroes = vec![full, svo];

        let filter = HeroFilter {
            period: Selection::from("Великая Отечественная война"),
            ..HeroFilter::default()
        };
        assert_eq!(ids(&filter.apply(&heroes)), vec![10]);

        let filter = HeroFilter {
            period: Selection::from("СВО"),
            ..HeroFilter::default()
        };
        assert_eq!(ids(&filter.apply(&heroes)), vec![11]);
    }

    #[test]
    fn region_requires_exact_match() {
        let mut tambov = hero(20, "A");
        tambov.region = "Тамбовская область".to_string();
        let heroes = vec![tambov];

        let partial = HeroFilter {
            region: Selection::from("Тамбов"),
            ..HeroFilter::default()
        };
        assert!(partial.apply(&heroes).is_empty());

        let exact = HeroFilter {
            region: Selection::from("Тамбовская область"),
            ..HeroFilter::default()
        };
        assert_eq!(ids(&exact.apply(&heroes)), vec![20]);
    }

    #[test]
    fn combined_filter_is_intersection_in_source_order() {
        let heroes = sample_heroes();
        let queries = ["", "а", "герой", "zzz"];
        let periods = [ALL, "Великая Отечественная война", "Чечня", "Афганистан"];
        let mut regions: Vec<Selection> = region_options(&heroes);
        regions.push(Selection::from("Нигде"));

        for query in queries {
            for period in periods {
                for region in &regions {
                    let filter = HeroFilter {
                        query: query.to_string(),
                        period: Selection::from(period),
                        region: region.clone(),
                    };
                    let expected: Vec<i64> = heroes
                        .iter()
                        .filter(|hero| filter.matches_query(hero))
                        .filter(|hero| filter.matches_period(hero))
                        .filter(|hero| filter.matches_region(hero))
                        .map(|hero| hero.id)
                        .collect();
                    assert_eq!(ids(&filter.apply(&heroes)), expected);
                }
            }
        }
    }

    #[test]
    fn region_options_are_sorted_and_prefixed() {
        let heroes = sample_heroes();
        let options = region_options(&heroes);
        assert_eq!(options[0], Selection::All);
        let names: Vec<&str> = options[1..].iter().map(Selection::as_str).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn sentinel_round_trips_through_strings() {
        assert_eq!(Selection::from("all"), Selection::All);
        assert_eq!(Selection::All.as_str(), "all");
        assert_eq!(Selection::from("Чечня").to_string(), "Чечня");
    }
}

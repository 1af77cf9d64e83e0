#![allow(missing_docs)]

//! Browsable catalogue: search, facet filters and list/detail navigation.

/// Search predicate, facet selections and region derivation.
pub mod filter;

pub use filter::{default_period_presets, region_options, HeroFilter, PeriodPreset, Selection, ALL};

use tracing::debug;

use crate::models::{unique_by_id, Hero};

/// Which of the two catalogue screens is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogueView {
    #[default]
    List,
    Detail(Hero),
}

/// Owns the fetched working set and everything the list/detail screens derive from it.
#[derive(Debug, Default)]
pub struct Catalogue {
    heroes: Vec<Hero>,
    regions: Vec<Selection>,
    filter: HeroFilter,
    view: CatalogueView,
}

impl Catalogue {
    pub fn new(heroes: Vec<Hero>) -> Self {
        let mut catalogue = Self::default();
        catalogue.set_heroes(heroes);
        catalogue
    }

    /// Replace the working set. Duplicate ids keep their first entry, regions are
    /// recomputed and a stale detail view is dropped.
    pub fn set_heroes(&mut self, heroes: Vec<Hero>) {
        self.heroes = unique_by_id(heroes);
        self.regions = region_options(&self.heroes);
        if !self.regions.contains(&self.filter.region) {
            debug!(region = %self.filter.region, "Selected region vanished; resetting");
            self.filter.region = Selection::All;
        }
        self.revalidate_view();
    }

    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    pub fn total(&self) -> usize {
        self.heroes.len()
    }

    pub fn regions(&self) -> &[Selection] {
        &self.regions
    }

    pub fn filter(&self) -> &HeroFilter {
        &self.filter
    }

    pub fn query(&self) -> &str {
        &self.filter.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
    }

    pub fn push_query_char(&mut self, ch: char) {
        self.filter.query.push(ch);
    }

    pub fn pop_query_char(&mut self) {
        self.filter.query.pop();
    }

    pub fn set_period(&mut self, period: impl Into<Selection>) {
        self.filter.period = period.into();
    }

    pub fn set_region(&mut self, region: impl Into<Selection>) {
        self.filter.region = region.into();
    }

    /// Advance the region facet through `regions()`, wrapping around.
    pub fn cycle_region(&mut self, delta: isize) {
        let len = self.regions.len() as isize;
        if len == 0 {
            return;
        }
        let current = self
            .regions
            .iter()
            .position(|region| *region == self.filter.region)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.filter.region = self.regions[next].clone();
    }

    /// Heroes passing the current filter, in source order.
    pub fn visible(&self) -> Vec<&Hero> {
        self.filter.apply(&self.heroes)
    }

    pub fn is_empty_result(&self) -> bool {
        !self.heroes.iter().any(|hero| self.filter.matches(hero))
    }

    pub fn view(&self) -> &CatalogueView {
        &self.view
    }

    pub fn selected(&self) -> Option<&Hero> {
        match &self.view {
            CatalogueView::Detail(hero) => Some(hero),
            CatalogueView::List => None,
        }
    }

    /// Open the detail view for a hero in the filtered set.
    pub fn select(&mut self, id: i64) -> bool {
        let Some(hero) = self
            .heroes
            .iter()
            .find(|hero| hero.id == id && self.filter.matches(hero))
        else {
            return false;
        };
        self.view = CatalogueView::Detail(hero.clone());
        true
    }

    /// Return to the list. Filters are left as they were.
    pub fn back(&mut self) {
        self.view = CatalogueView::List;
    }

    /// Drop the detail view if it points at `id`.
    pub fn forget(&mut self, id: i64) {
        if self.selected().map(|hero| hero.id) == Some(id) {
            self.view = CatalogueView::List;
        }
    }

    fn revalidate_view(&mut self) {
        let Some(selected_id) = self.selected().map(|hero| hero.id) else {
            return;
        };
        match self.heroes.iter().find(|hero| hero.id == selected_id) {
            Some(current) => self.view = CatalogueView::Detail(current.clone()),
            None => {
                debug!(id = selected_id, "Selected hero no longer present");
                self.view = CatalogueView::List;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hero, sample_heroes};

    #[test]
    fn select_and_back_preserve_filters() {
        let mut catalogue = Catalogue::new(sample_heroes());
        catalogue.set_query("а");
        catalogue.set_period("Великая Отечественная война");
        catalogue.set_region("Тамбовская область");
        let before = catalogue.filter().clone();

        let id = catalogue.visible()[0].id;
        assert!(catalogue.select(id));
        assert_eq!(catalogue.selected().map(|hero| hero.id), Some(id));

        catalogue.back();
        assert_eq!(catalogue.view(), &CatalogueView::List);
        assert_eq!(catalogue.filter(), &before);
    }

    #[test]
    fn select_ignores_hidden_heroes() {
        let mut catalogue = Catalogue::new(sample_heroes());
        catalogue.set_period("Чечня");
        assert!(!catalogue.select(1));
        assert_eq!(catalogue.view(), &CatalogueView::List);
    }

    #[test]
    fn unmatched_search_reports_empty_result() {
        let mut catalogue = Catalogue::new(sample_heroes());
        assert!(!catalogue.is_empty_result());
        catalogue.set_query("Несуществующий");
        assert!(catalogue.visible().is_empty());
        assert!(catalogue.is_empty_result());
    }

    #[test]
    fn regions_follow_data_refresh() {
        let mut catalogue = Catalogue::new(sample_heroes());
        catalogue.set_region("Новосибирская область");

        let mut fresh = vec![hero(9, "Новый")];
        fresh[0].region = "Курская область".to_string();
        catalogue.set_heroes(fresh);

        let regions: Vec<&str> = catalogue.regions().iter().map(Selection::as_str).collect();
        assert_eq!(regions, vec![ALL, "Курская область"]);
        assert_eq!(catalogue.filter().region, Selection::All);
    }

    #[test]
    fn refresh_drops_deleted_detail_and_updates_edited_one() {
        let mut catalogue = Catalogue::new(sample_heroes());
        assert!(catalogue.select(2));

        let mut heroes = sample_heroes();
        heroes[1].rank = "Герой Советского Союза".to_string();
        catalogue.set_heroes(heroes.clone());
        assert_eq!(
            catalogue.selected().map(|hero| hero.rank.as_str()),
            Some("Герой Советского Союза")
        );

        heroes.remove(1);
        catalogue.set_heroes(heroes);
        assert_eq!(catalogue.view(), &CatalogueView::List);
    }

    #[test]
    fn forget_only_clears_matching_detail() {
        let mut catalogue = Catalogue::new(sample_heroes());
        assert!(catalogue.select(3));
        catalogue.forget(1);
        assert!(catalogue.selected().is_some());
        catalogue.forget(3);
        assert!(catalogue.selected().is_none());
    }

    #[test]
    fn duplicate_ids_collapse_like_the_admin_list() {
        let mut heroes = sample_heroes();
        heroes.push(hero(2, "Дубликат"));
        let catalogue = Catalogue::new(heroes.clone());
        let panel = crate::admin::AdminPanel::new(heroes);

        assert_eq!(catalogue.total(), 5);
        assert_eq!(catalogue.heroes(), panel.heroes());
    }

    #[test]
    fn region_literally_named_all_is_selectable() {
        let mut odd = hero(9, "Странный");
        odd.region = ALL.to_string();
        let mut catalogue = Catalogue::new(vec![odd, hero(10, "Обычный")]);

        let literal = Selection::Only(ALL.to_string());
        assert!(catalogue.regions().contains(&literal));
        catalogue.cycle_region(1);
        assert_eq!(catalogue.filter().region, literal);
        let ids: Vec<i64> = catalogue.visible().iter().map(|hero| hero.id).collect();
        assert_eq!(ids, vec![9]);
    }

    #[test]
    fn cycle_region_wraps() {
        let mut catalogue = Catalogue::new(sample_heroes());
        let count = catalogue.regions().len() as isize;
        catalogue.cycle_region(1);
        assert_eq!(catalogue.filter().region, catalogue.regions()[1]);
        catalogue.cycle_region(count - 1);
        assert_eq!(catalogue.filter().region, Selection::All);
        catalogue.cycle_region(-1);
        assert_eq!(
            catalogue.filter().region,
            catalogue.regions()[(count - 1) as usize]
        );
    }
}

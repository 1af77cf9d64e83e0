use thiserror::Error;

use crate::models::{Hero, TimelineEntry};

/// Editable fields of the admin dialog, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Rank,
    Image,
    Period,
    BirthYear,
    Conflict,
    Region,
    Awards,
    Biography,
    Timeline,
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::Name,
        FormField::Rank,
        FormField::Image,
        FormField::Period,
        FormField::BirthYear,
        FormField::Conflict,
        FormField::Region,
        FormField::Awards,
        FormField::Biography,
        FormField::Timeline,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Полное имя",
            FormField::Rank => "Звание/должность",
            FormField::Image => "URL изображения",
            FormField::Period => "Период жизни",
            FormField::BirthYear => "Год рождения",
            FormField::Conflict => "Конфликт",
            FormField::Region => "Регион",
            FormField::Awards => "Награды (через запятую)",
            FormField::Biography => "Биография",
            FormField::Timeline => "Временная шкала (год: событие)",
        }
    }

    /// Fields that accept line breaks.
    pub fn is_multiline(self) -> bool {
        matches!(self, FormField::Biography | FormField::Timeline)
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }
}

/// Reasons a submission is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("field \"{}\" is required", .0.label())]
    MissingField(FormField),

    #[error("birth year \"{0}\" is not a number")]
    InvalidBirthYear(String),

    #[error("timeline line {line} must look like \"year: event\": {content:?}")]
    InvalidTimelineLine { line: usize, content: String },

    #[error("at least one award is required")]
    EmptyAwards,
}

/// Raw text buffer behind the add/edit dialog. Parsing is deferred to [`HeroForm::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroForm {
    pub name: String,
    pub rank: String,
    pub image: String,
    pub period: String,
    pub birth_year: String,
    pub conflict: String,
    pub region: String,
    pub awards: String,
    pub biography: String,
    pub timeline: String,
}

/// Normalized form contents, waiting for an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroDraft {
    pub name: String,
    pub rank: String,
    pub image: String,
    pub period: String,
    pub conflict: String,
    pub region: String,
    pub awards: Vec<String>,
    pub birth_year: i32,
    pub biography: String,
    pub timeline: Vec<TimelineEntry>,
}

impl HeroDraft {
    pub fn into_hero(self, id: i64) -> Hero {
        Hero {
            id,
            name: self.name,
            rank: self.rank,
            image: self.image,
            period: self.period,
            conflict: self.conflict,
            region: self.region,
            awards: self.awards,
            birth_year: self.birth_year,
            biography: self.biography,
            timeline: self.timeline,
        }
    }
}

impl HeroForm {
    /// Populate the buffer from an existing hero.
    pub fn from_hero(hero: &Hero) -> Self {
        Self {
            name: hero.name.clone(),
            rank: hero.rank.clone(),
            image: hero.image.clone(),
            period: hero.period.clone(),
            birth_year: hero.birth_year.to_string(),
            conflict: hero.conflict.clone(),
            region: hero.region.clone(),
            awards: join_awards(&hero.awards),
            biography: hero.biography.clone(),
            timeline: format_timeline(&hero.timeline),
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Rank => &self.rank,
            FormField::Image => &self.image,
            FormField::Period => &self.period,
            FormField::BirthYear => &self.birth_year,
            FormField::Conflict => &self.conflict,
            FormField::Region => &self.region,
            FormField::Awards => &self.awards,
            FormField::Biography => &self.biography,
            FormField::Timeline => &self.timeline,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Rank => &mut self.rank,
            FormField::Image => &mut self.image,
            FormField::Period => &mut self.period,
            FormField::BirthYear => &mut self.birth_year,
            FormField::Conflict => &mut self.conflict,
            FormField::Region => &mut self.region,
            FormField::Awards => &mut self.awards,
            FormField::Biography => &mut self.biography,
            FormField::Timeline => &mut self.timeline,
        }
    }

    /// First field left blank, in display order.
    pub fn missing_field(&self) -> Option<FormField> {
        FormField::ALL
            .into_iter()
            .find(|field| self.field(*field).trim().is_empty())
    }

    /// Turn the raw buffer into structured data.
    pub fn normalize(&self) -> Result<HeroDraft, FormError> {
        if let Some(field) = self.missing_field() {
            return Err(FormError::MissingField(field));
        }

        let birth_year = self
            .birth_year
            .trim()
            .parse::<i32>()
            .map_err(|_| FormError::InvalidBirthYear(self.birth_year.clone()))?;

        let awards = split_awards(&self.awards);
        if awards.is_empty() {
            return Err(FormError::EmptyAwards);
        }

        let timeline = parse_timeline(&self.timeline)?;

        Ok(HeroDraft {
            name: self.name.clone(),
            rank: self.rank.clone(),
            image: self.image.clone(),
            period: self.period.clone(),
            conflict: self.conflict.clone(),
            region: self.region.clone(),
            awards,
            birth_year,
            biography: self.biography.clone(),
            timeline,
        })
    }
}

pub fn join_awards(awards: &[String]) -> String {
    awards.join(", ")
}

/// Comma separated, trimmed, empty pieces dropped.
pub fn split_awards(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|award| !award.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_timeline(timeline: &[TimelineEntry]) -> String {
    timeline
        .iter()
        .map(|entry| format!("{}: {}", entry.year, entry.event))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `year: event` entry per non-blank line. Only the first `:` separates.
pub fn parse_timeline(text: &str) -> Result<Vec<TimelineEntry>, FormError> {
    let mut entries = Vec::new();
    for (idx, line) in text.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let invalid = || FormError::InvalidTimelineLine {
            line: idx + 1,
            content: line.trim().to_string(),
        };
        let (year, event) = line.split_once(':').ok_or_else(invalid)?;
        let year = year.trim().parse::<i32>().map_err(|_| invalid())?;
        entries.push(TimelineEntry {
            year,
            event: event.trim().to_string(),
        });
    }
    Ok(entries)
}

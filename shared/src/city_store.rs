//! Favorite cities grouped by country.
//!
//! Countries are kept in case-sensitive lexicographic order. Cities keep the
//! order the user gave them: index 0 is the most favorite city of a country.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{instrument, warn};

type Groups = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CityStoreError {
    #[error("country not found: {country}")]
    NotFound { country: String },

    #[error("city index {index} out of range for {country} ({len} cities)")]
    IndexOutOfRange {
        country: String,
        index: usize,
        len: usize,
    },

    #[error("cannot move a city from {from} to {to}")]
    CrossGroupMove { from: String, to: String },

    #[error("country name cannot be empty")]
    EmptyCountryName,
}

/// A row in the grouped list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CityPosition {
    pub country: String,
    pub index: usize,
}

impl CityPosition {
    pub fn new(country: impl Into<String>, index: usize) -> Self {
        Self {
            country: country.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Groups", into = "Groups")]
pub struct CityStore {
    groups: Groups,
}

impl CityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All countries, sorted ascending (case-sensitive).
    pub fn countries(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn cities_of(&self, country: &str) -> Result<&[String], CityStoreError> {
        self.groups
            .get(country)
            .map(Vec::as_slice)
            .ok_or_else(|| not_found(country))
    }

    pub fn city_at(&self, country: &str, index: usize) -> Result<&str, CityStoreError> {
        let cities = self.cities_of(country)?;
        check_index(country, index, cities.len())?;
        Ok(&cities[index])
    }

    /// Countries with their cities, in display order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(country, cities)| (country.as_str(), cities.as_slice()))
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.groups.contains_key(country)
    }

    /// Number of countries.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn city_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Appends `city` as the least favorite city of `country`, creating the
    /// country when needed.
    #[instrument(level = "debug", skip(self, country, city))]
    pub fn add_city(&mut self, country: impl Into<String>, city: impl Into<String>) {
        self.groups
            .entry(country.into())
            .or_default()
            .push(city.into());
    }

    /// Removes the city at `index`. A country left without cities is dropped.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_city(&mut self, country: &str, index: usize) -> Result<String, CityStoreError> {
        let cities = self
            .groups
            .get_mut(country)
            .ok_or_else(|| not_found(country))?;
        check_index(country, index, cities.len())?;

        let removed = cities.remove(index);
        if cities.is_empty() {
            self.groups.remove(country);
        }
        Ok(removed)
    }

    /// Moves the city at `from` so that it ends up exactly at `to`; the cities
    /// in between shift by one slot.
    #[instrument(level = "debug", skip(self))]
    pub fn move_city(&mut self, country: &str, from: usize, to: usize) -> Result<(), CityStoreError> {
        let cities = self
            .groups
            .get_mut(country)
            .ok_or_else(|| not_found(country))?;
        check_index(country, from, cities.len())?;
        check_index(country, to, cities.len())?;

        if from != to {
            let city = cities.remove(from);
            cities.insert(to, city);
        }
        Ok(())
    }

    /// Reorders one row onto another. Both rows must belong to the same
    /// country.
    pub fn move_between(
        &mut self,
        from: &CityPosition,
        to: &CityPosition,
    ) -> Result<(), CityStoreError> {
        if from.country != to.country {
            return Err(CityStoreError::CrossGroupMove {
                from: from.country.clone(),
                to: to.country.clone(),
            });
        }
        self.move_city(&from.country, from.index, to.index)
    }
}

fn not_found(country: &str) -> CityStoreError {
    CityStoreError::NotFound {
        country: country.to_string(),
    }
}

fn check_index(country: &str, index: usize, len: usize) -> Result<(), CityStoreError> {
    if index < len {
        Ok(())
    } else {
        Err(CityStoreError::IndexOutOfRange {
            country: country.to_string(),
            index,
            len,
        })
    }
}

impl TryFrom<Groups> for CityStore {
    type Error = CityStoreError;

    fn try_from(mut groups: Groups) -> Result<Self, Self::Error> {
        if groups.contains_key("") {
            return Err(CityStoreError::EmptyCountryName);
        }

        groups.retain(|country, cities| {
            if cities.is_empty() {
                warn!(country = %country, "dropping country without cities");
                false
            } else {
                true
            }
        });

        Ok(Self { groups })
    }
}

impl From<CityStore> for Groups {
    fn from(store: CityStore) -> Self {
        store.groups
    }
}

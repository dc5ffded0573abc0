//! HTTP catalog client.

use crate::features::plants::models::string_or_number;
use crate::features::plants::{Frequency, Plant};
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Pseudo-environment that matches every plant
pub const ALL_ENVIRONMENTS_KEY: &str = "all";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("catalog page numbers start at 1")]
    InvalidPage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub key: String,
    pub title: String,
}

/// A plant as listed by the catalog, before a reminder time is chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPlant {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub water_tips: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub environments: BTreeSet<String>,
    pub frequency: Frequency,
}

impl CatalogPlant {
    pub fn into_plant(self, date_time_notification: DateTime<Utc>) -> Plant {
        Plant {
            id: self.id,
            name: self.name,
            about: self.about,
            water_tips: self.water_tips,
            photo: self.photo,
            environments: self.environments,
            frequency: self.frequency,
            hour: String::new(),
            date_time_notification,
        }
    }
}

pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, page_size: u32) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
        })
    }

    pub fn environments_url(&self) -> String {
        format!("{}/plants_environments?_sort=title&_order=asc", self.base_url)
    }

    pub fn plants_url(&self, page: u32) -> Result<String, CatalogError> {
        if page == 0 {
            return Err(CatalogError::InvalidPage);
        }
        Ok(format!(
            "{}/plants?_sort=name&_order=asc&_page={}&_limit={}",
            self.base_url, page, self.page_size
        ))
    }

    pub fn plant_url(&self, id: &str) -> String {
        format!("{}/plants/{}", self.base_url, id)
    }

    /// Every environment sorted by title, led by the "all" option
    pub async fn environments(&self) -> Result<Vec<Environment>, CatalogError> {
        let environments: Vec<Environment> = self.get_json(&self.environments_url()).await?;
        Ok(with_all_option(environments))
    }

    /// One page of plants sorted by name; an empty page means the end
    pub async fn plants(&self, page: u32) -> Result<Vec<CatalogPlant>, CatalogError> {
        let url = self.plants_url(page)?;
        self.get_json(&url).await
    }

    /// A single plant, or `None` when the catalog does not know the id
    pub async fn find_plant(&self, id: &str) -> Result<Option<CatalogPlant>, CatalogError> {
        let url = self.plant_url(id);
        debug!("GET {url}");
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, &url)?;
        Ok(Some(response.json().await?))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        let response = check_status(response, url)?;
        Ok(response.json().await?)
    }
}

fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, CatalogError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(CatalogError::Status {
            status: response.status(),
            url: url.to_string(),
        })
    }
}

/// Prepend the "all" pseudo-environment
pub fn with_all_option(environments: Vec<Environment>) -> Vec<Environment> {
    let mut all = Vec::with_capacity(environments.len() + 1);
    all.push(Environment {
        key: ALL_ENVIRONMENTS_KEY.to_string(),
        title: "Todos".to_string(),
    });
    all.extend(
        environments
            .into_iter()
            .filter(|env| env.key != ALL_ENVIRONMENTS_KEY),
    );
    all
}

/// Plants living in `environment`; the "all" key keeps everything
pub fn filter_by_environment(plants: &[CatalogPlant], environment: &str) -> Vec<CatalogPlant> {
    if environment == ALL_ENVIRONMENTS_KEY {
        return plants.to_vec();
    }
    plants
        .iter()
        .filter(|plant| plant.environments.contains(environment))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::plants::RepeatEvery;

    fn sample_page() -> Vec<CatalogPlant> {
        serde_json::from_str(
            r#"[
                {
                    "id": 1,
                    "name": "Aningapara",
                    "about": "Gosta de sombra.",
                    "water_tips": "Mantenha a terra sempre úmida.",
                    "photo": "https://example.com/1.svg",
                    "environments": ["living_room", "kitchen"],
                    "frequency": { "times": 2, "repeat_every": "week" }
                },
                {
                    "id": "2",
                    "name": "Zamioculca",
                    "about": "Resistente.",
                    "water_tips": "Regue pouco.",
                    "photo": "https://example.com/2.svg",
                    "environments": ["bedroom"],
                    "frequency": { "times": 1, "repeat_every": "day" }
                }
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_catalog_json_decodes_numeric_and_string_ids() {
        let plants = sample_page();
        assert_eq!(plants[0].id, "1");
        assert_eq!(plants[1].id, "2");
        assert_eq!(plants[1].frequency.repeat_every, RepeatEvery::Day);
    }

    #[test]
    fn test_urls() {
        let client = CatalogClient::new("http://localhost:3333/", 8).unwrap();
        assert_eq!(
            client.environments_url(),
            "http://localhost:3333/plants_environments?_sort=title&_order=asc"
        );
        assert_eq!(
            client.plants_url(2).unwrap(),
            "http://localhost:3333/plants?_sort=name&_order=asc&_page=2&_limit=8"
        );
        assert_eq!(client.plant_url("5"), "http://localhost:3333/plants/5");
        assert!(matches!(
            client.plants_url(0),
            Err(CatalogError::InvalidPage)
        ));
    }

    #[test]
    fn test_all_option_leads() {
        let envs = with_all_option(vec![
            Environment {
                key: "bathroom".to_string(),
                title: "Banheiro".to_string(),
            },
            Environment {
                key: "kitchen".to_string(),
                title: "Cozinha".to_string(),
            },
        ]);
        let keys: Vec<&str> = envs.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["all", "bathroom", "kitchen"]);
        assert_eq!(envs[0].title, "Todos");
    }

    #[test]
    fn test_filter_by_environment() {
        let plants = sample_page();
        assert_eq!(filter_by_environment(&plants, "all").len(), 2);

        let kitchen = filter_by_environment(&plants, "kitchen");
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0].name, "Aningapara");

        assert!(filter_by_environment(&plants, "garage").is_empty());
    }

    #[test]
    fn test_into_plant_keeps_catalog_fields() {
        let at = Utc::now();
        let plant = sample_page().remove(0).into_plant(at);
        assert_eq!(plant.id, "1");
        assert_eq!(plant.water_tips, "Mantenha a terra sempre úmida.");
        assert_eq!(plant.date_time_notification, at);
        assert!(plant.hour.is_empty());
    }
}

//! Chat search: free text -> bounded, deterministic catalog query
//!
//! Control flow: greeting short-circuit -> empty-catalog check ->
//! embed + extract (concurrent) -> either a direct filtered query when
//! constraints were extracted, or intent routing with feature
//! reconciliation and fallback chains when they were not.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use super::intent;
use crate::db::models::Car;
use crate::db::{CarFilters, CarOrder, Repository, SortColumn, SortDirection};
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::extraction::{EntityExtractor, ExtractedEntities, SortKey, SortOrder};

pub struct ChatService {
    repo: Repository,
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn EntityExtractor>,
}

/// Either a result list or a structured message; both are HTTP 200 so the
/// chat UX never looks like an error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChatReply {
    Cars(Vec<Car>),
    Message { message: String },
}

impl ChatReply {
    fn message(text: impl Into<String>) -> Self {
        Self::Message {
            message: text.into(),
        }
    }
}

/// Translate the constraint bag into AND-combined predicates.
/// `features` must already be reconciled against the live vocabulary.
fn build_filters(entities: &ExtractedEntities, features: Vec<String>) -> CarFilters {
    CarFilters {
        price: entities.price,
        price_min: entities.price_min,
        price_max: entities.price_max,
        mileage: entities.mileage,
        mileage_min: entities.mileage_min,
        mileage_max: entities.mileage_max,
        year: entities.year,
        year_min: entities.year_min,
        year_max: entities.year_max,
        color: entities.color.clone(),
        transmission: entities.transmission,
        fuel_type: entities.fuel_type,
        company_name: entities.company_name.clone(),
        model: entities.model.clone(),
        features,
    }
}

/// Ordering for the filtered path: the explicit sort if one was extracted,
/// otherwise similarity to the query embedding, otherwise recency when the
/// embedding backend failed.
fn resolve_order(entities: &ExtractedEntities, query_embedding: Option<Vec<f32>>) -> CarOrder {
    let direction = match entities.sort_order {
        Some(SortOrder::Desc) => SortDirection::Desc,
        _ => SortDirection::Asc,
    };

    match entities.sort_by {
        Some(SortKey::Price) => CarOrder::Scalar(SortColumn::Price, direction),
        Some(SortKey::Mileage) => CarOrder::Scalar(SortColumn::Mileage, direction),
        Some(SortKey::Year) => CarOrder::Scalar(SortColumn::Year, direction),
        Some(SortKey::Model) => CarOrder::Scalar(SortColumn::Model, direction),
        Some(SortKey::Color) => CarOrder::Scalar(SortColumn::Color, direction),
        Some(SortKey::CompanyName) => CarOrder::Scalar(SortColumn::CompanyName, direction),
        Some(SortKey::Random) => CarOrder::Random,
        Some(SortKey::Featured) => CarOrder::Featured,
        None => match query_embedding {
            Some(embedding) => CarOrder::Distance(embedding),
            None => CarOrder::Recency,
        },
    }
}

impl ChatService {
    pub fn new(
        repo: Repository,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn EntityExtractor>,
    ) -> Self {
        Self {
            repo,
            embedder,
            extractor,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<ChatReply, AppError> {
        let start = Instant::now();
        metrics::counter!("carhub_chat_queries_total").increment(1);

        if let Some(reply) = intent::greeting_reply(query) {
            metrics::counter!("carhub_chat_greetings_total").increment(1);
            return Ok(ChatReply::message(reply));
        }

        if self.repo.count_cars().await? == 0 {
            return Ok(ChatReply::message(intent::NO_CARS_MESSAGE));
        }

        // Independent external calls; both must settle before any
        // filtering or ranking decision.
        let (embedding, extracted) = tokio::join!(
            self.embedder.embed_query(query),
            self.extractor.extract(query)
        );

        let query_embedding = match embedding {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = %e, "Embedding failed; falling back to recency ordering");
                None
            }
        };

        // Extraction is best-effort: any failure degrades to the empty bag
        let entities = match extracted {
            Ok(bag) => bag,
            Err(e) => {
                tracing::warn!(error = %e, "Entity extraction failed; degrading to empty constraints");
                metrics::counter!("carhub_chat_extraction_failures_total").increment(1);
                ExtractedEntities::default()
            }
        };

        let reconciled = if entities.features.is_empty() {
            Vec::new()
        } else {
            let vocabulary = self.repo.feature_vocabulary().await?;
            intent::reconcile_features(query, &vocabulary)
        };

        let filters = build_filters(&entities, reconciled);

        let reply = if filters.is_empty() {
            self.route_intent(query).await?
        } else {
            let limit = intent::clamp_limit(entities.limit);
            let order = resolve_order(&entities, query_embedding);
            let cars = self.repo.search_cars(&filters, &order, limit).await?;
            if cars.is_empty() {
                ChatReply::message(intent::NO_MATCH_MESSAGE)
            } else {
                ChatReply::Cars(cars)
            }
        };

        metrics::histogram!("carhub_chat_duration_seconds").record(start.elapsed().as_secs_f64());
        Ok(reply)
    }

    /// Keyword-heuristic routing for queries with no extracted constraints.
    async fn route_intent(&self, query: &str) -> Result<ChatReply, AppError> {
        let limit = intent::clamp_limit(intent::parse_top_n(query));

        if !intent::has_search_trigger(query) {
            return Ok(ChatReply::message(intent::HELP_MESSAGE));
        }

        // Vocabulary is recomputed per request; fine at current catalog scale
        let vocabulary = self.repo.feature_vocabulary().await?;
        let features = intent::reconcile_features(query, &vocabulary);

        if !features.is_empty() {
            // Feature-filtered results are deliberately not ranked by
            // embedding distance.
            let filters = CarFilters {
                features,
                ..Default::default()
            };
            let cars = self
                .repo
                .search_cars(&filters, &CarOrder::Unordered, limit)
                .await?;
            if !cars.is_empty() {
                return Ok(ChatReply::Cars(cars));
            }

            // Fallback drops the feature filter entirely: N most recent
            metrics::counter!("carhub_chat_fallbacks_total").increment(1);
            let fallback = self
                .repo
                .search_cars(&CarFilters::default(), &CarOrder::Recency, limit)
                .await?;
            if fallback.is_empty() {
                return Ok(ChatReply::message(intent::HELP_MESSAGE));
            }
            return Ok(ChatReply::Cars(fallback));
        }

        let order = intent::classify_sort(query);
        let cars = self
            .repo
            .search_cars(&CarFilters::default(), &order, limit)
            .await?;
        Ok(ChatReply::Cars(cars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::FuelType;

    fn bag(raw: &str) -> ExtractedEntities {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn scenario_top_5_lowest_price_red_electric() {
        // "top 5 lowest price red electric cars from 2020 to 2023 with sunroof"
        let entities = bag(
            r#"{
                "color": "red",
                "fuel_type": "electric",
                "year_min": 2020,
                "year_max": 2023,
                "features": ["sunroof"],
                "sort_by": "price",
                "sort_order": "asc",
                "limit": 5
            }"#,
        );

        let filters = build_filters(&entities, vec!["sunroof".to_string()]);
        assert!(!filters.is_empty());
        assert_eq!(filters.color.as_deref(), Some("red"));
        assert_eq!(filters.fuel_type, Some(FuelType::Electric));
        assert_eq!(filters.year_min, Some(2020));
        assert_eq!(filters.year_max, Some(2023));
        assert_eq!(filters.features, vec!["sunroof"]);

        assert!(matches!(
            resolve_order(&entities, None),
            CarOrder::Scalar(SortColumn::Price, SortDirection::Asc)
        ));
        assert_eq!(intent::clamp_limit(entities.limit), 5);
    }

    #[test]
    fn unmatched_entity_features_leave_filters_empty() {
        // Extraction found a feature mention but nothing reconciled against
        // the catalog vocabulary: the bag contributes no predicates and the
        // query falls through to intent routing.
        let entities = bag(r#"{"features": ["hyperdrive"]}"#);
        let filters = build_filters(&entities, Vec::new());
        assert!(filters.is_empty());
    }

    #[test]
    fn default_order_is_similarity_when_embedding_present() {
        let entities = ExtractedEntities::default();
        assert!(matches!(
            resolve_order(&entities, Some(vec![0.0; 4])),
            CarOrder::Distance(_)
        ));
    }

    #[test]
    fn default_order_degrades_to_recency_without_embedding() {
        let entities = ExtractedEntities::default();
        assert!(matches!(resolve_order(&entities, None), CarOrder::Recency));
    }

    #[test]
    fn explicit_sort_overrides_similarity() {
        let entities = bag(r#"{"sort_by": "year", "sort_order": "desc"}"#);
        assert!(matches!(
            resolve_order(&entities, Some(vec![0.0; 4])),
            CarOrder::Scalar(SortColumn::Year, SortDirection::Desc)
        ));
    }

    #[test]
    fn random_and_featured_sorts() {
        let entities = bag(r#"{"sort_by": "random"}"#);
        assert!(matches!(resolve_order(&entities, None), CarOrder::Random));
        let entities = bag(r#"{"sort_by": "featured"}"#);
        assert!(matches!(resolve_order(&entities, None), CarOrder::Featured));
    }

    #[test]
    fn missing_sort_order_defaults_to_ascending() {
        let entities = bag(r#"{"sort_by": "mileage"}"#);
        assert!(matches!(
            resolve_order(&entities, None),
            CarOrder::Scalar(SortColumn::Mileage, SortDirection::Asc)
        ));
    }

    #[test]
    fn message_reply_serializes_as_envelope() {
        let reply = ChatReply::message("No cars available");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json, serde_json::json!({"message": "No cars available"}));
    }

    #[test]
    fn cars_reply_serializes_as_list() {
        let reply = ChatReply::Cars(Vec::new());
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json, serde_json::json!([]));
    }
}

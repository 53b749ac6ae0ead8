//! Persisted shop filter state.
//!
//! Filters are written back to the [`LocalStore`] after every change and read
//! again on the next request, so the shop keeps its state across page loads.

use zone7_core::filters::{FilterAction, ShopFilters};

use crate::store::{LocalStore, StoreError, keys};

/// Rehydrate the filter state. Missing fields take their defaults; a corrupt
/// value is ignored with a warning.
///
/// # Errors
///
/// Returns an error if the store itself fails.
pub async fn load_filters<S: LocalStore>(store: &S) -> Result<ShopFilters, StoreError> {
    match store.get_json::<ShopFilters>(keys::SHOP_FILTERS).await {
        Ok(filters) => Ok(filters.unwrap_or_default()),
        Err(StoreError::Serialization(e)) => {
            tracing::warn!(error = %e, "Ignoring corrupt shop filters");
            Ok(ShopFilters::default())
        }
        Err(e) => Err(e),
    }
}

/// Persist the filter state.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn save_filters<S: LocalStore>(store: &S, filters: &ShopFilters) -> Result<(), StoreError> {
    store.set_json(keys::SHOP_FILTERS, filters).await
}

/// Apply one action to the stored state and persist the result.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn apply_filter_action<S: LocalStore>(
    store: &S,
    action: &FilterAction,
) -> Result<ShopFilters, StoreError> {
    let mut filters = load_filters(store).await?;
    filters.apply(action);
    save_filters(store, &filters).await?;
    tracing::debug!(?action, page = filters.current_page, "Shop filters updated");
    Ok(filters)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use zone7_core::filters::FilterSection;

    #[tokio::test]
    async fn test_state_survives_rehydrate() {
        let store = MemoryStore::new();
        apply_filter_action(&store, &FilterAction::ToggleCategory { name: "Men".into() })
            .await
            .unwrap();
        apply_filter_action(&store, &FilterAction::Paginate { page: 2 })
            .await
            .unwrap();
        apply_filter_action(
            &store,
            &FilterAction::ToggleSection {
                section: FilterSection::Stock,
            },
        )
        .await
        .unwrap();

        let filters = load_filters(&store).await.unwrap();
        assert_eq!(filters.selected_categories, vec!["men"]);
        assert_eq!(filters.current_page, 2);
        assert!(!filters.expanded_sections.stock);
    }

    #[tokio::test]
    async fn test_corrupt_value_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store
            .set(keys::SHOP_FILTERS, "{not json".to_string())
            .await
            .unwrap();
        assert_eq!(load_filters(&store).await.unwrap(), ShopFilters::default());
    }

    #[tokio::test]
    async fn test_missing_value_is_default() {
        let store = MemoryStore::new();
        assert_eq!(load_filters(&store).await.unwrap(), ShopFilters::default());
    }
}

use std::collections::HashSet;

use tracing::info;

use crate::api::FavoritesApi;
use crate::domain::customer::UserId;
use crate::domain::package::PackageId;
use crate::errors::ApiError;

/// Adds or removes one favorite and returns the new membership.
pub async fn toggle_favorite<A>(
    api: &A,
    user_id: &UserId,
    package_id: &PackageId,
    currently_favorite: bool,
) -> Result<bool, ApiError>
where
    A: FavoritesApi + ?Sized,
{
    if currently_favorite {
        api.remove_favorite(user_id, package_id).await?;
    } else {
        api.add_favorite(user_id, package_id).await?;
    }

    let favorite = !currently_favorite;
    info!(
        event_name = "favorites.toggled",
        user_id = %user_id,
        package_id = %package_id,
        favorite,
        "favorite toggled"
    );
    Ok(favorite)
}

/// Local view of a user's favorites, hydrated once and kept in step with toggles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    ids: HashSet<PackageId>,
}

impl FavoriteSet {
    pub async fn load<A>(api: &A, user_id: &UserId) -> Result<Self, ApiError>
    where
        A: FavoritesApi + ?Sized,
    {
        let packages = api.favorites(user_id).await?;
        Ok(packages.into_iter().map(|package| package.id).collect())
    }

    pub fn contains(&self, package_id: &PackageId) -> bool {
        self.ids.contains(package_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The set is only updated after the backend accepted the change.
    pub async fn toggle<A>(
        &mut self,
        api: &A,
        user_id: &UserId,
        package_id: &PackageId,
    ) -> Result<bool, ApiError>
    where
        A: FavoritesApi + ?Sized,
    {
        let favorite = toggle_favorite(api, user_id, package_id, self.contains(package_id)).await?;
        if favorite {
            self.ids.insert(package_id.clone());
        } else {
            self.ids.remove(package_id);
        }
        Ok(favorite)
    }
}

impl FromIterator<PackageId> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = PackageId>>(iter: I) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::api::FavoritesApi;
    use crate::domain::customer::UserId;
    use crate::domain::package::{Package, PackageId};
    use crate::errors::ApiError;

    use super::{toggle_favorite, FavoriteSet};

    #[derive(Default)]
    struct InMemoryFavorites {
        stored: Mutex<BTreeSet<String>>,
        fail_writes: bool,
    }

    fn stub_package(id: &str) -> Package {
        serde_json::from_value(serde_json::json!({ "id": id, "name": id, "price": 1000 }))
            .expect("stub package")
    }

    #[async_trait]
    impl FavoritesApi for InMemoryFavorites {
        async fn favorites(&self, _user_id: &UserId) -> Result<Vec<Package>, ApiError> {
            let stored = self.stored.lock().expect("favorites lock");
            Ok(stored.iter().map(|id| stub_package(id)).collect())
        }

        async fn add_favorite(
            &self,
            _user_id: &UserId,
            package_id: &PackageId,
        ) -> Result<(), ApiError> {
            if self.fail_writes {
                return Err(ApiError::ServiceUnavailable { status: 503 });
            }
            self.stored.lock().expect("favorites lock").insert(package_id.0.clone());
            Ok(())
        }

        async fn remove_favorite(
            &self,
            _user_id: &UserId,
            package_id: &PackageId,
        ) -> Result<(), ApiError> {
            if self.fail_writes {
                return Err(ApiError::ServiceUnavailable { status: 503 });
            }
            self.stored.lock().expect("favorites lock").remove(&package_id.0);
            Ok(())
        }
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let api = InMemoryFavorites::default();
        let user = UserId("u-42".to_string());
        let package = PackageId("roopkund".to_string());

        assert!(toggle_favorite(&api, &user, &package, false).await.expect("add"));
        assert!(api.stored.lock().expect("favorites lock").contains("roopkund"));

        assert!(!toggle_favorite(&api, &user, &package, true).await.expect("remove"));
        assert!(api.stored.lock().expect("favorites lock").is_empty());
    }

    #[tokio::test]
    async fn set_hydrates_from_backend_and_tracks_toggles() {
        let api = InMemoryFavorites::default();
        api.stored.lock().expect("favorites lock").insert("kedarnath-yatra".to_string());
        let user = UserId("u-42".to_string());

        let mut favorites = FavoriteSet::load(&api, &user).await.expect("hydrate");
        assert!(favorites.contains(&PackageId("kedarnath-yatra".to_string())));

        let added = favorites
            .toggle(&api, &user, &PackageId("roopkund".to_string()))
            .await
            .expect("toggle on");
        assert!(added);
        assert_eq!(favorites.len(), 2);
    }

    #[tokio::test]
    async fn failed_write_leaves_local_set_unchanged() {
        let api = InMemoryFavorites { fail_writes: true, ..InMemoryFavorites::default() };
        let user = UserId("u-42".to_string());
        let mut favorites = FavoriteSet::default();

        let error = favorites
            .toggle(&api, &user, &PackageId("roopkund".to_string()))
            .await
            .expect_err("backend down");

        assert!(error.is_transient());
        assert!(favorites.is_empty());
    }
}

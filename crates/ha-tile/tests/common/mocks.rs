//! Doubles for the Tile cloud

use std::sync::Arc;

use async_trait::async_trait;
use ha_tile::TileLogin;
use ha_tile_client::{
    MockTileApi, MockTileConnection, Tile, TileApi, TileDetailsResponse, TileError, TileMap,
    TileResult,
};
use mockall::mock;
use rstest::fixture;

use super::fixtures::data_tile_details;

mock! {
    pub Login {}

    #[async_trait]
    impl TileLogin for Login {
        async fn login(&self, username: &str, password: &str) -> TileResult<Arc<dyn TileApi>>;
    }
}

/// A Tile built from `payload` whose updates hand back the same payload
pub fn static_tile(payload: &TileDetailsResponse) -> Arc<Tile> {
    let mut connection = MockTileConnection::new();
    let refreshed = payload.clone();
    connection
        .expect_tile_details()
        .returning(move |_| Ok(refreshed.clone()));

    Arc::new(Tile::new(Some(Arc::new(connection)), payload.clone()))
}

/// Client whose `async_get_tiles` returns exactly `tiles`
pub fn api_with_tiles(tiles: Vec<Arc<Tile>>) -> Arc<dyn TileApi> {
    let mut api = MockTileApi::new();
    api.expect_async_get_tiles().returning(move || {
        Ok(tiles
            .iter()
            .map(|tile| (tile.uuid().to_string(), tile.clone()))
            .collect::<TileMap>())
    });
    Arc::new(api)
}

/// Mock client holding the single fixture Tile
#[fixture]
pub fn api(data_tile_details: &'static TileDetailsResponse) -> Arc<dyn TileApi> {
    api_with_tiles(vec![static_tile(data_tile_details)])
}

/// Login that always succeeds with `api`
pub fn login_returning(api: Arc<dyn TileApi>) -> Arc<dyn TileLogin> {
    let mut login = MockLogin::new();
    login.expect_login().returning(move |_, _| Ok(api.clone()));
    Arc::new(login)
}

/// Login that always fails with `error`
pub fn login_failing(error: TileError) -> Arc<dyn TileLogin> {
    let mut login = MockLogin::new();
    login.expect_login().returning(move |_, _| Err(error.clone()));
    Arc::new(login)
}

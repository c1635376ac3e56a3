use std::borrow::Cow;
use std::sync::Arc;

use contextful::{AsContext, Context};
use derivative::Derivative;

use crate::config::{Config, MediaConfig};
use crate::db::Db;
use crate::error::AppResult;
use crate::media::{CloudinaryStore, LocalMediaStore, SharedMediaStore};
use crate::tokens::TokenKeys;
use crate::usecases::{
    FavoriteUsecase, ProfileUsecase, RecipeUsecase, ReviewUsecase, TagUsecase, UserUsecase,
};

/// The composition root: everything a handler can reach.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct AppCtx {
    pub db: Db,
    pub tokens: TokenKeys,
    #[derivative(Debug = "ignore")]
    pub media: SharedMediaStore,
    #[derivative(Debug = "ignore")]
    pub users: UserUsecase,
    #[derivative(Debug = "ignore")]
    pub profiles: ProfileUsecase,
    #[derivative(Debug = "ignore")]
    pub recipes: RecipeUsecase,
    #[derivative(Debug = "ignore")]
    pub reviews: ReviewUsecase,
    #[derivative(Debug = "ignore")]
    pub tags: TagUsecase,
    #[derivative(Debug = "ignore")]
    pub favorites: FavoriteUsecase,
}

impl Context for AppCtx {}

impl AsContext<TokenKeys> for AppCtx {
    fn as_context(&self) -> Cow<'_, TokenKeys> {
        Cow::Borrowed(&self.tokens)
    }
}

impl AppCtx {
    pub fn new(config: &Config) -> AppResult<Self> {
        let db = Db::connect(&config.database_url, config.database_pool_size)?;
        let media: SharedMediaStore = match &config.media {
            MediaConfig::Cloudinary(cloudinary) => Arc::new(CloudinaryStore::new(cloudinary.clone())?),
            MediaConfig::Local(local) => Arc::new(LocalMediaStore::new(local.clone())),
        };
        tracing::info!(media = ?media, "media store configured");
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_ttl);
        Ok(Self::from_parts(db, tokens, media))
    }

    /// Wires the use-cases around already built resources.
    pub fn from_parts(db: Db, tokens: TokenKeys, media: SharedMediaStore) -> Self {
        Self {
            users: UserUsecase::new(db.clone(), tokens.clone()),
            profiles: ProfileUsecase::new(db.clone(), media.clone()),
            recipes: RecipeUsecase::new(db.clone(), media.clone()),
            reviews: ReviewUsecase::new(db.clone()),
            tags: TagUsecase::new(db.clone()),
            favorites: FavoriteUsecase::new(db.clone()),
            db,
            tokens,
            media,
        }
    }
}
